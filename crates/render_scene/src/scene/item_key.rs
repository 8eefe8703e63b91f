//! Item classification keys and the filters that bucket them
//!
//! A key is a small flag set describing how an item renders. A filter is a
//! `value`/`mask` pair: only the masked bits are compared, so one filter can
//! say "shape, not translucent" while ignoring everything else.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Classification bits carried by an [`ItemKey`]
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct ItemKeyFlags: u32 {
        /// Item is geometry drawn in a shape pass
        const TYPE_SHAPE = 1 << 0;
        /// Item is a light source
        const TYPE_LIGHT = 1 << 1;
        /// Item is part of the background (sky, clear color)
        const TYPE_BACKGROUND = 1 << 2;
        /// Item needs alpha blending
        const TRANSLUCENT = 1 << 3;
        /// Item is positioned in view space instead of world space
        const VIEW_SPACE = 1 << 4;
        /// Item transform changes between frames
        const DYNAMIC = 1 << 5;
        /// Item geometry is skinned or otherwise deformed
        const DEFORMED = 1 << 6;
        /// Item is currently hidden
        const INVISIBLE = 1 << 7;
        /// Item casts shadows
        const SHADOW_CASTER = 1 << 8;
        /// Item takes part in picking
        const PICKABLE = 1 << 9;
        /// Item is drawn in an overlay layer
        const LAYERED = 1 << 10;
    }
}

/// Cached classification of an item's payload
///
/// The default key is the zero key held by empty and killed items.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ItemKey {
    flags: ItemKeyFlags,
}

impl ItemKey {
    /// Create a key from raw flags
    pub const fn new(flags: ItemKeyFlags) -> Self {
        Self { flags }
    }

    /// Start building a key
    pub fn builder() -> ItemKeyBuilder {
        ItemKeyBuilder::default()
    }

    /// Opaque world-space shape
    pub fn opaque_shape() -> Self {
        Self::builder().with_type_shape().build()
    }

    /// Translucent world-space shape
    pub fn transparent_shape() -> Self {
        Self::builder().with_type_shape().with_transparent().build()
    }

    /// Light source
    pub fn light() -> Self {
        Self::builder().with_type_light().build()
    }

    /// Background item
    pub fn background() -> Self {
        Self::builder().with_type_background().build()
    }

    /// Raw flags
    pub const fn flags(&self) -> ItemKeyFlags {
        self.flags
    }

    /// True for the zero key
    pub const fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }
}

/// Flag queries
#[allow(missing_docs)]
impl ItemKey {
    pub fn is_shape(&self) -> bool {
        self.flags.contains(ItemKeyFlags::TYPE_SHAPE)
    }

    pub fn is_light(&self) -> bool {
        self.flags.contains(ItemKeyFlags::TYPE_LIGHT)
    }

    pub fn is_background(&self) -> bool {
        self.flags.contains(ItemKeyFlags::TYPE_BACKGROUND)
    }

    pub fn is_opaque(&self) -> bool {
        !self.is_transparent()
    }

    pub fn is_transparent(&self) -> bool {
        self.flags.contains(ItemKeyFlags::TRANSLUCENT)
    }

    pub fn is_world_space(&self) -> bool {
        !self.is_view_space()
    }

    pub fn is_view_space(&self) -> bool {
        self.flags.contains(ItemKeyFlags::VIEW_SPACE)
    }

    pub fn is_static(&self) -> bool {
        !self.is_dynamic()
    }

    pub fn is_dynamic(&self) -> bool {
        self.flags.contains(ItemKeyFlags::DYNAMIC)
    }

    pub fn is_deformed(&self) -> bool {
        self.flags.contains(ItemKeyFlags::DEFORMED)
    }

    pub fn is_visible(&self) -> bool {
        !self.flags.contains(ItemKeyFlags::INVISIBLE)
    }

    pub fn is_shadow_caster(&self) -> bool {
        self.flags.contains(ItemKeyFlags::SHADOW_CASTER)
    }

    pub fn is_pickable(&self) -> bool {
        self.flags.contains(ItemKeyFlags::PICKABLE)
    }

    pub fn is_layered(&self) -> bool {
        self.flags.contains(ItemKeyFlags::LAYERED)
    }
}

impl From<ItemKeyFlags> for ItemKey {
    fn from(flags: ItemKeyFlags) -> Self {
        Self::new(flags)
    }
}

/// Builder for [`ItemKey`]
#[derive(Debug, Clone, Copy, Default)]
pub struct ItemKeyBuilder {
    flags: ItemKeyFlags,
}

#[allow(missing_docs)]
impl ItemKeyBuilder {
    #[must_use]
    pub fn with_type_shape(mut self) -> Self {
        self.flags |= ItemKeyFlags::TYPE_SHAPE;
        self
    }

    #[must_use]
    pub fn with_type_light(mut self) -> Self {
        self.flags |= ItemKeyFlags::TYPE_LIGHT;
        self
    }

    #[must_use]
    pub fn with_type_background(mut self) -> Self {
        self.flags |= ItemKeyFlags::TYPE_BACKGROUND;
        self
    }

    #[must_use]
    pub fn with_transparent(mut self) -> Self {
        self.flags |= ItemKeyFlags::TRANSLUCENT;
        self
    }

    #[must_use]
    pub fn with_view_space(mut self) -> Self {
        self.flags |= ItemKeyFlags::VIEW_SPACE;
        self
    }

    #[must_use]
    pub fn with_dynamic(mut self) -> Self {
        self.flags |= ItemKeyFlags::DYNAMIC;
        self
    }

    #[must_use]
    pub fn with_deformed(mut self) -> Self {
        self.flags |= ItemKeyFlags::DEFORMED;
        self
    }

    #[must_use]
    pub fn with_invisible(mut self) -> Self {
        self.flags |= ItemKeyFlags::INVISIBLE;
        self
    }

    #[must_use]
    pub fn with_shadow_caster(mut self) -> Self {
        self.flags |= ItemKeyFlags::SHADOW_CASTER;
        self
    }

    #[must_use]
    pub fn with_pickable(mut self) -> Self {
        self.flags |= ItemKeyFlags::PICKABLE;
        self
    }

    #[must_use]
    pub fn with_layered(mut self) -> Self {
        self.flags |= ItemKeyFlags::LAYERED;
        self
    }

    pub const fn build(self) -> ItemKey {
        ItemKey::new(self.flags)
    }
}

/// Predicate over [`ItemKey`] deciding bucket membership
///
/// `test` only looks at the bits in `mask`, and there they must equal `value`.
/// An empty mask accepts every key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "RawItemFilter")]
pub struct ItemFilter {
    value: ItemKeyFlags,
    mask: ItemKeyFlags,
}

/// Serialized form of [`ItemFilter`]; value bits outside the mask are dropped on load
#[derive(Deserialize)]
struct RawItemFilter {
    value: ItemKeyFlags,
    mask: ItemKeyFlags,
}

impl From<RawItemFilter> for ItemFilter {
    fn from(raw: RawItemFilter) -> Self {
        Self::new(raw.value, raw.mask)
    }
}

impl ItemFilter {
    /// Create a filter from raw value and mask bits
    pub fn new(value: ItemKeyFlags, mask: ItemKeyFlags) -> Self {
        Self {
            value: value & mask,
            mask,
        }
    }

    /// Start building a filter
    pub fn builder() -> ItemFilterBuilder {
        ItemFilterBuilder::default()
    }

    /// Does `key` qualify for this filter
    pub fn test(&self, key: &ItemKey) -> bool {
        (key.flags() & self.mask) == self.value
    }

    /// Bits that must match
    pub const fn value(&self) -> ItemKeyFlags {
        self.value
    }

    /// Bits that are compared
    pub const fn mask(&self) -> ItemKeyFlags {
        self.mask
    }

    /// World-space shapes without translucency
    pub fn opaque_shape() -> Self {
        Self::builder()
            .with_type_shape()
            .with_opaque()
            .with_world_space()
            .build()
    }

    /// World-space translucent shapes
    pub fn transparent_shape() -> Self {
        Self::builder()
            .with_type_shape()
            .with_transparent()
            .with_world_space()
            .build()
    }

    /// Light sources
    pub fn light() -> Self {
        Self::builder().with_type_light().build()
    }

    /// Background items
    pub fn background() -> Self {
        Self::builder().with_type_background().build()
    }

    /// Accepts every key, including the zero key
    pub fn everything() -> Self {
        Self::default()
    }
}

/// Builder for [`ItemFilter`]
///
/// Each `with_*` call pins one bit: it enters the mask and gets the requested
/// value. Later calls on the same bit override earlier ones.
#[derive(Debug, Clone, Copy, Default)]
pub struct ItemFilterBuilder {
    value: ItemKeyFlags,
    mask: ItemKeyFlags,
}

#[allow(missing_docs)]
impl ItemFilterBuilder {
    #[must_use]
    fn pin(mut self, bit: ItemKeyFlags, set: bool) -> Self {
        self.mask |= bit;
        self.value.set(bit, set);
        self
    }

    #[must_use]
    pub fn with_type_shape(self) -> Self {
        self.pin(ItemKeyFlags::TYPE_SHAPE, true)
    }

    #[must_use]
    pub fn with_type_light(self) -> Self {
        self.pin(ItemKeyFlags::TYPE_LIGHT, true)
    }

    #[must_use]
    pub fn with_type_background(self) -> Self {
        self.pin(ItemKeyFlags::TYPE_BACKGROUND, true)
    }

    #[must_use]
    pub fn with_opaque(self) -> Self {
        self.pin(ItemKeyFlags::TRANSLUCENT, false)
    }

    #[must_use]
    pub fn with_transparent(self) -> Self {
        self.pin(ItemKeyFlags::TRANSLUCENT, true)
    }

    #[must_use]
    pub fn with_world_space(self) -> Self {
        self.pin(ItemKeyFlags::VIEW_SPACE, false)
    }

    #[must_use]
    pub fn with_view_space(self) -> Self {
        self.pin(ItemKeyFlags::VIEW_SPACE, true)
    }

    #[must_use]
    pub fn with_static(self) -> Self {
        self.pin(ItemKeyFlags::DYNAMIC, false)
    }

    #[must_use]
    pub fn with_dynamic(self) -> Self {
        self.pin(ItemKeyFlags::DYNAMIC, true)
    }

    #[must_use]
    pub fn with_rigid(self) -> Self {
        self.pin(ItemKeyFlags::DEFORMED, false)
    }

    #[must_use]
    pub fn with_deformed(self) -> Self {
        self.pin(ItemKeyFlags::DEFORMED, true)
    }

    #[must_use]
    pub fn with_visible(self) -> Self {
        self.pin(ItemKeyFlags::INVISIBLE, false)
    }

    #[must_use]
    pub fn with_invisible(self) -> Self {
        self.pin(ItemKeyFlags::INVISIBLE, true)
    }

    #[must_use]
    pub fn with_shadow_caster(self) -> Self {
        self.pin(ItemKeyFlags::SHADOW_CASTER, true)
    }

    #[must_use]
    pub fn with_pickable(self) -> Self {
        self.pin(ItemKeyFlags::PICKABLE, true)
    }

    #[must_use]
    pub fn with_layered(self) -> Self {
        self.pin(ItemKeyFlags::LAYERED, true)
    }

    #[must_use]
    pub fn with_nothing_layered(self) -> Self {
        self.pin(ItemKeyFlags::LAYERED, false)
    }

    pub fn build(self) -> ItemFilter {
        ItemFilter::new(self.value, self.mask)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_filters_are_disjoint() {
        let opaque = ItemKey::opaque_shape();
        let transparent = ItemKey::transparent_shape();

        assert!(ItemFilter::opaque_shape().test(&opaque));
        assert!(!ItemFilter::transparent_shape().test(&opaque));
        assert!(ItemFilter::transparent_shape().test(&transparent));
        assert!(!ItemFilter::opaque_shape().test(&transparent));
    }

    #[test]
    fn test_zero_key_matches_no_standard_filter() {
        let zero = ItemKey::default();
        assert!(zero.is_empty());
        assert!(!ItemFilter::opaque_shape().test(&zero));
        assert!(!ItemFilter::transparent_shape().test(&zero));
        assert!(!ItemFilter::light().test(&zero));
        assert!(ItemFilter::everything().test(&zero));
    }

    #[test]
    fn test_unmasked_bits_are_ignored() {
        let key = ItemKey::builder()
            .with_type_shape()
            .with_dynamic()
            .with_shadow_caster()
            .build();

        assert!(ItemFilter::opaque_shape().test(&key));
        assert!(!ItemFilter::builder().with_static().build().test(&key));
        assert!(ItemFilter::builder().with_dynamic().build().test(&key));
    }

    #[test]
    fn test_view_space_shape_excluded_from_world_buckets() {
        let overlay = ItemKey::builder().with_type_shape().with_view_space().build();
        assert!(!ItemFilter::opaque_shape().test(&overlay));
        assert!(ItemFilter::builder()
            .with_type_shape()
            .with_view_space()
            .build()
            .test(&overlay));
    }

    #[test]
    fn test_later_pin_overrides_earlier() {
        let filter = ItemFilter::builder().with_opaque().with_transparent().build();
        assert_eq!(filter, ItemFilter::builder().with_transparent().build());
    }

    #[test]
    fn test_new_drops_value_bits_outside_mask() {
        let filter = ItemFilter::new(
            ItemKeyFlags::TYPE_SHAPE | ItemKeyFlags::DYNAMIC,
            ItemKeyFlags::TYPE_SHAPE,
        );
        assert_eq!(filter.value(), ItemKeyFlags::TYPE_SHAPE);
        assert!(filter.test(&ItemKey::opaque_shape()));
    }

    #[test]
    fn test_key_queries() {
        let key = ItemKey::builder()
            .with_type_light()
            .with_invisible()
            .with_pickable()
            .build();
        assert!(key.is_light());
        assert!(!key.is_shape());
        assert!(!key.is_visible());
        assert!(key.is_pickable());
        assert!(key.is_static());
        assert!(key.is_world_space());
        assert!(key.is_opaque());
    }
}
