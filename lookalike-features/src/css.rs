use crate::bucket;
use lookalike_dom::StyleSheetMap;

/// Hashed bag over the stylesheet's rule set, used when CSS is not
/// projected onto the markup.
///
/// Every selector is paired with every rule of the sheet, so the vector
/// reflects which rules co-occur rather than where they apply.
#[derive(Debug, Clone)]
pub struct CssExtractor {
    pub dim: usize,
}

impl CssExtractor {
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }

    /// Empty when `dim` is zero.
    pub fn extract(&self, sheet: &StyleSheetMap) -> Vec<f32> {
        if self.dim == 0 {
            return Vec::new();
        }
        let mut features = vec![0.0f32; self.dim];
        for selector in sheet.selectors() {
            for (key, declarations) in sheet.iter() {
                let token = format!("{selector}_{key}_{declarations}");
                features[bucket(&token, self.dim)] += 1.0;
            }
        }
        features
    }
}
