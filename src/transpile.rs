// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The source-to-executable transform boundary.
//!
//! The transpiler is an external collaborator: a pure function from source
//! text to executable code plus a position map for diagnostics. The runtime
//! invokes it once per module execution and treats any failure (e.g. a
//! syntax error) as a module-execution failure.

use crate::error::Result;

/// File extensions recognized as source modules, in resolution order.
pub const SOURCE_EXTENSIONS: &[&str] = &[".ts", ".tsx"];

/// Check whether a file name follows the source-module naming convention.
pub fn is_source_file(name: &str) -> bool {
    SOURCE_EXTENSIONS.iter().any(|ext| name.ends_with(ext))
}

/// Options passed to the transpiler alongside the raw source text.
#[derive(Debug, Clone)]
pub struct TransformOptions {
    /// Real path of the file being transformed, for diagnostics.
    pub file_path: String,
}

/// Line mapping from generated code back to the original source.
///
/// An empty map is the identity mapping.
#[derive(Debug, Clone, Default)]
pub struct PositionMap {
    pairs: Vec<(u32, u32)>,
}

impl PositionMap {
    /// Build a map from `(generated, original)` line pairs, sorted by
    /// generated line.
    pub fn from_pairs(pairs: Vec<(u32, u32)>) -> Self {
        Self { pairs }
    }

    /// Map a generated line back to its original line.
    pub fn original_line(&self, generated: u32) -> u32 {
        self.pairs
            .iter()
            .rev()
            .find(|(gen_line, _)| *gen_line <= generated)
            .map(|(_, orig)| *orig)
            .unwrap_or(generated)
    }
}

/// Executable output of one transform.
#[derive(Debug, Clone)]
pub struct Transformed {
    /// Executable code produced from the source text.
    pub code: String,
    /// Position map for diagnostics.
    pub positions: PositionMap,
}

/// Source-to-executable transform, invoked once per module execution.
pub trait Transpiler {
    /// Transform raw source text into executable code plus a position map.
    fn transform(&self, source: &str, options: &TransformOptions) -> Result<Transformed>;
}

/// Identity transform: the code is the source text unchanged.
#[derive(Debug, Default)]
pub struct Passthrough;

impl Transpiler for Passthrough {
    fn transform(&self, source: &str, _options: &TransformOptions) -> Result<Transformed> {
        Ok(Transformed {
            code: source.to_string(),
            positions: PositionMap::default(),
        })
    }
}
