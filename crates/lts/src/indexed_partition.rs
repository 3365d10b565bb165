use std::fmt;

/// A trait for partitions that expose the block number for every state.
///
/// The invariants are that the union of all blocks is the original set, and
/// that each block contains distinct elements
pub trait Partition {
    /// Returns the block number for the given state.
    fn block_number(&self, state_index: usize) -> usize;

    /// Returns the number of blocks in the partition.
    fn num_of_blocks(&self) -> usize;
}

/// Defines a partition based on an explicit indexing of elements to their block
/// number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedPartition {
    partition: Vec<usize>,

    num_of_blocks: usize,
}

impl IndexedPartition {
    /// Create a new partition where all elements are in a single block.
    pub fn new(num_of_elements: usize) -> IndexedPartition {
        IndexedPartition {
            partition: vec![0; num_of_elements],
            num_of_blocks: if num_of_elements == 0 { 0 } else { 1 },
        }
    }

    /// Sets the block number of the given element, block numbers are expected
    /// to be dense.
    pub fn set_block(&mut self, element_index: usize, block_number: usize) {
        self.num_of_blocks = self.num_of_blocks.max(block_number + 1);

        self.partition[element_index] = block_number;
    }

    /// Returns the elements of every block, indexed by block number.
    pub fn blocks(&self) -> Vec<Vec<usize>> {
        let mut result = vec![Vec::new(); self.num_of_blocks];
        for (element_index, block) in self.partition.iter().enumerate() {
            result[*block].push(element_index);
        }

        result
    }
}

impl fmt::Display for IndexedPartition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{ ")?;

        let mut first = true;
        for block in self.blocks() {
            if block.is_empty() {
                continue;
            }

            if !first {
                write!(f, ", ")?;
            }

            write!(f, "{{")?;
            for (position, element_index) in block.iter().enumerate() {
                if position > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", element_index)?;
            }
            write!(f, "}}")?;

            first = false;
        }

        write!(f, " }}")
    }
}

impl Partition for IndexedPartition {
    fn block_number(&self, state_index: usize) -> usize {
        self.partition[state_index]
    }

    fn num_of_blocks(&self) -> usize {
        self.num_of_blocks
    }
}
