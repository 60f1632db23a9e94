use crate::types::{BinId, ColorCategory};

/// Fixed routing from colour category to sorting bin.
///
/// GREEN and UNKNOWN share BIN C.
#[derive(Debug, Clone, Copy, Default)]
pub struct BinMapper;

impl BinMapper {
    pub fn map(&self, category: ColorCategory) -> BinId {
        match category {
            ColorCategory::Red => BinId::BinA,
            ColorCategory::Blue => BinId::BinB,
            ColorCategory::Green | ColorCategory::Unknown => BinId::BinC,
        }
    }
}
