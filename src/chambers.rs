use crate::geometry::Dimensions;

/// Row-bitmap connectivity analyzer. Detects which board positions can reach
/// each other through non-arrow cells and how large each connected region
/// (chamber) is. Used to detect endgames and estimate territory control.
///
/// One u32 word represents one board row, which is where the 32-column board
/// limit comes from.
#[derive(Debug, Clone)]
pub struct ChamberAnalyzer {
    dimensions: Dimensions,
    /// One word per row, bit set where an arrow stands.
    arrow_bitmap: Vec<u32>,
    /// Packed position -> provisional group id.
    group_board: Vec<u32>,
    /// Group id -> group id union-find style mapping; a root maps to itself.
    group_mappings: Vec<u32>,
    /// Group id -> accumulated cell count. Only valid at roots.
    group_sizes: Vec<u32>,
    /// Per-row run masks, indexed by group id.
    group_masks: Vec<u32>,
}

impl ChamberAnalyzer {
    /// Creates an analyzer for an arrowless board; `place_arrow` and `update`
    /// populate it.
    pub fn new(dimensions: Dimensions) -> Self {
        ChamberAnalyzer {
            dimensions,
            arrow_bitmap: vec![0; dimensions.height as usize],
            group_board: vec![0; dimensions.array_size as usize],
            group_mappings: vec![0; dimensions.board_size as usize],
            group_sizes: vec![0; dimensions.board_size as usize],
            group_masks: Vec::with_capacity(dimensions.board_size as usize),
        }
    }

    /// Marks a position as an arrow. The partition is stale until the next
    /// `update`.
    pub fn place_arrow(&mut self, position: u32) {
        self.arrow_bitmap[self.dimensions.y(position) as usize] |=
            1 << self.dimensions.x(position);
    }

    /// Recomputes all group mappings and sizes from the current arrow bitmap.
    ///
    /// Rows are scanned top to bottom. Each row's empty bits split into
    /// maximal runs; a run joins a run of the row above when their widened
    /// masks overlap (8-adjacency). A group id maps to itself until it is
    /// merged into a later group, and sizes flow to the surviving id.
    pub fn update(&mut self) {
        self.group_masks.clear();
        let mut previous_base = 0;
        self.compute_group_masks(self.arrow_bitmap[0], 0);
        for y in 1..self.dimensions.height {
            let next_base = self.group_masks.len();
            self.compute_group_masks(self.arrow_bitmap[y as usize], y);
            for i in next_base..self.group_masks.len() {
                let connection_mask = self.connection_mask(self.group_masks[i]);
                for j in previous_base..next_base {
                    if connection_mask & self.group_masks[j] == 0 {
                        continue;
                    }
                    if self.group_mappings[j] == j as u32 {
                        // A self-mapped run joins the new group and hands its
                        // size over.
                        self.group_mappings[j] = self.group_mappings[i];
                        self.group_sizes[i] += self.group_sizes[j];
                    } else {
                        // Already merged elsewhere; point the new group at
                        // that established root instead.
                        let established = self.group_mappings[j] as usize;
                        self.group_mappings[i] = self.group_mappings[established];
                    }
                }
                if self.group_mappings[i] != i as u32 {
                    let root = self.group_mappings[i] as usize;
                    self.group_sizes[root] += self.group_sizes[i];
                }
            }
            previous_base = next_base;
        }
    }

    // Splits one bitmap row into maximal empty runs. Assigns each covered
    // position its provisional group id and records the run's mask and size.
    fn compute_group_masks(&mut self, row: u32, y: u32) {
        let width = self.dimensions.width;
        let y_offset = (y * self.dimensions.stride) as usize;
        let mut shift = 0;
        loop {
            while shift < width && (row >> shift) & 1 != 0 {
                shift += 1;
            }
            let mut group = 0u32;
            let mut size = 0u32;
            while shift < width && (row >> shift) & 1 == 0 {
                group |= 1 << shift;
                self.group_board[shift as usize + y_offset] = self.group_masks.len() as u32;
                shift += 1;
                size += 1;
            }
            if group != 0 {
                let index = self.group_masks.len();
                self.group_masks.push(group);
                self.group_mappings[index] = index as u32;
                self.group_sizes[index] = size;
            }
            if shift >= width {
                break;
            }
        }
    }

    // Widens a run mask by one bit in each direction; overlap with a
    // neighboring row's run means the two are 8-connected.
    fn connection_mask(&self, row: u32) -> u32 {
        let width_mask = ((1u64 << self.dimensions.width) - 1) as u32;
        (row | (row << 1) | (row >> 1)) & width_mask
    }

    /// Resolves the chamber id of a position by following mappings to their
    /// fixpoint. Undefined for arrow or off-board positions; not checked, the
    /// caller is on the hot path.
    pub fn position_chamber(&self, position: u32) -> u32 {
        let mut mapping = self.group_board[position as usize];
        while self.group_mappings[mapping as usize] != mapping {
            mapping = self.group_mappings[mapping as usize];
        }
        mapping
    }

    /// Cell count of a chamber, queen cells included.
    pub fn chamber_size(&self, chamber: u32) -> u32 {
        self.group_sizes[chamber as usize]
    }
}
