use serde::{Deserialize, Serialize};

/// Element type of a descriptor extractor's output rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DescriptorType {
    Binary,
    Float,
}

/// Row-major descriptor matrix. Row `i` describes keypoint `i` of the frame.
#[derive(Debug, Clone, PartialEq)]
pub enum DescriptorMatrix {
    Binary { bytes_per_row: usize, data: Vec<u8> },
    Float { dims: usize, data: Vec<f32> },
}

impl DescriptorMatrix {
    pub fn empty(output: DescriptorType, width: usize) -> DescriptorMatrix {
        match output {
            DescriptorType::Binary => DescriptorMatrix::Binary {
                bytes_per_row: width,
                data: Vec::new(),
            },
            DescriptorType::Float => DescriptorMatrix::Float {
                dims: width,
                data: Vec::new(),
            },
        }
    }

    pub fn output_type(&self) -> DescriptorType {
        match self {
            DescriptorMatrix::Binary { .. } => DescriptorType::Binary,
            DescriptorMatrix::Float { .. } => DescriptorType::Float,
        }
    }

    /// Number of elements per row.
    pub fn width(&self) -> usize {
        match self {
            DescriptorMatrix::Binary { bytes_per_row, .. } => *bytes_per_row,
            DescriptorMatrix::Float { dims, .. } => *dims,
        }
    }

    pub fn rows(&self) -> usize {
        let width = self.width();
        if width == 0 {
            return 0;
        }
        match self {
            DescriptorMatrix::Binary { data, .. } => data.len() / width,
            DescriptorMatrix::Float { data, .. } => data.len() / width,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows() == 0
    }

    pub fn binary_row(&self, row: usize) -> Option<&[u8]> {
        match self {
            DescriptorMatrix::Binary {
                bytes_per_row,
                data,
            } => data.get(row * bytes_per_row..(row + 1) * bytes_per_row),
            DescriptorMatrix::Float { .. } => None,
        }
    }

    pub fn float_row(&self, row: usize) -> Option<&[f32]> {
        match self {
            DescriptorMatrix::Float { dims, data } => data.get(row * dims..(row + 1) * dims),
            DescriptorMatrix::Binary { .. } => None,
        }
    }
}
