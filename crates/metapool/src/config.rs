//! Compile-time metapool configuration.
//!
//! A [`MetapoolConfig`] fully determines one family of freelists: the stride
//! range, the step between size classes, the base block count, and a
//! [`CapacityFunction`] describing how block counts change at declared pivot
//! strides. Construction is a `const fn`; when a configuration lives in a
//! `const` item (the normal case, through [`MetasetSpec`]), every validation
//! failure below surfaces as a compile error.
//!
//! [`MetasetSpec`]: crate::metaset::MetasetSpec

/// Bytes of the routing header stored in front of every user pointer.
pub const HEADER_SIZE: usize = 2;

/// Minimum alignment applied to every allocation request.
pub const ALIGNMENT_QUANTUM: u32 = 8;

/// Alignment of the first user region of every freelist.
pub const FREELIST_ALIGNMENT: usize = 4096;

/// Alignment of the arena's backing region.
pub const ARENA_ALIGNMENT: usize = 4096;

/// Hard cap on the total arena demand of one metaset.
pub const MAX_ARENA_SIZE: usize = 8 << 30;

/// Hard cap on the global freelist count of one metaset.
pub const MAX_PROXY_COUNT: u32 = 4096;

/// Stride bounds, step bounds, and block-count floors.
pub const MIN_STRIDE: u32 = 8;
pub const MAX_STRIDE: u32 = 1 << 30;
pub const MIN_STRIDE_STEP: u32 = 8;
pub const MAX_STRIDE_STEP: u32 = 512 << 20;
pub const MIN_BASE_BLOCK_COUNT: u32 = 1;
pub const MIN_LAST_BLOCK_COUNT: u32 = 1;

/// How block counts evolve when the class walk crosses a pivot stride.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapacityFunction {
    /// Divide the running count by 8, floored at one block.
    Div8,
    /// Divide the running count by 4, floored at one block.
    Div4,
    /// Divide the running count by 2, floored at one block.
    Div2,
    /// Keep the running count unchanged.
    Flat,
    /// Double the running count.
    Mul2,
    /// Quadruple the running count.
    Mul4,
    /// Multiply the running count by 8.
    Mul8,
}

impl CapacityFunction {
    const fn apply(self, count: u32) -> u32 {
        match self {
            CapacityFunction::Div8 => floor_count(count / 8),
            CapacityFunction::Div4 => floor_count(count / 4),
            CapacityFunction::Div2 => floor_count(count / 2),
            CapacityFunction::Flat => count,
            CapacityFunction::Mul2 => count * 2,
            CapacityFunction::Mul4 => count * 4,
            CapacityFunction::Mul8 => count * 8,
        }
    }
}

const fn floor_count(count: u32) -> u32 {
    if count < MIN_LAST_BLOCK_COUNT {
        MIN_LAST_BLOCK_COUNT
    } else {
        count
    }
}

/// One metapool declaration: a stride range with a capacity-growth policy.
///
/// `pivots` is the declared pivot list: the first entry is the smallest
/// stride, the last entry the largest, and every interior entry marks a
/// stride at which the capacity function is applied to the running block
/// count. An equal first/last pair declares a single-stride pool.
///
/// # Example
///
/// ```
/// use metapool::config::{CapacityFunction, MetapoolConfig};
///
/// // Strides 32, 64, ..., 512; 64 blocks each up to 256, 32 blocks after.
/// const POOL: MetapoolConfig =
///     MetapoolConfig::new(CapacityFunction::Div2, 64, 32, &[32, 256, 512]);
///
/// assert_eq!(POOL.stride_count(), 16);
/// assert_eq!(POOL.block_count_at(0), 64);
/// assert_eq!(POOL.block_count_at(15), 32);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct MetapoolConfig {
    capacity_function: CapacityFunction,
    base_block_count: u32,
    stride_step: u32,
    pivots: &'static [u32],
}

impl MetapoolConfig {
    /// Validates and builds one metapool declaration.
    ///
    /// # Panics
    ///
    /// Panics (a compile error in const context) when the declaration is
    /// malformed: block count below one, step not a power of two or outside
    /// `[MIN_STRIDE_STEP, MAX_STRIDE_STEP]`, fewer than two pivots, pivots
    /// outside `[MIN_STRIDE, MAX_STRIDE]`, off the step, or not strictly
    /// increasing (an equal pair is the single-stride form), or a computed
    /// class count that overflows.
    #[must_use]
    pub const fn new(
        capacity_function: CapacityFunction,
        base_block_count: u32,
        stride_step: u32,
        pivots: &'static [u32],
    ) -> Self {
        assert!(
            base_block_count >= MIN_BASE_BLOCK_COUNT,
            "metapool base block count must be at least one"
        );
        assert!(
            stride_step.is_power_of_two(),
            "metapool stride step must be a power of two"
        );
        assert!(
            stride_step >= MIN_STRIDE_STEP && stride_step <= MAX_STRIDE_STEP,
            "metapool stride step out of bounds"
        );
        assert!(pivots.len() >= 2, "metapool needs at least two pivots");

        let single = pivots.len() == 2 && pivots[0] == pivots[1];

        let mut i = 0;
        while i < pivots.len() {
            let pivot = pivots[i];
            assert!(
                pivot >= MIN_STRIDE && pivot <= MAX_STRIDE,
                "metapool pivot stride out of bounds"
            );
            assert!(
                pivot % stride_step == 0,
                "metapool pivot must be a multiple of the stride step"
            );
            if i > 0 && !single {
                assert!(
                    pivot > pivots[i - 1],
                    "metapool pivots must be strictly increasing"
                );
            }
            i += 1;
        }

        // Walk the pivot crossings once so count overflow is a config error,
        // not a construction-time surprise.
        let mut count = base_block_count;
        let mut i = 1;
        while i < pivots.len() {
            match count.checked_mul(8) {
                Some(_) => {}
                None => panic!("metapool block count overflows at a pivot"),
            }
            count = capacity_function.apply(count);
            i += 1;
        }
        assert!(
            count >= MIN_LAST_BLOCK_COUNT,
            "metapool last class must keep at least one block"
        );

        Self {
            capacity_function,
            base_block_count,
            stride_step,
            pivots,
        }
    }

    /// Smallest stride of the pool.
    #[must_use]
    pub const fn stride_min(&self) -> u32 {
        self.pivots[0]
    }

    /// Largest stride of the pool (inclusive — it is the last valid class).
    #[must_use]
    pub const fn stride_max(&self) -> u32 {
        self.pivots[self.pivots.len() - 1]
    }

    /// Step between adjacent size classes.
    #[must_use]
    pub const fn stride_step(&self) -> u32 {
        self.stride_step
    }

    /// Declared capacity-growth policy.
    #[must_use]
    pub const fn capacity_function(&self) -> CapacityFunction {
        self.capacity_function
    }

    /// Block count of the smallest class.
    #[must_use]
    pub const fn base_block_count(&self) -> u32 {
        self.base_block_count
    }

    /// Number of size classes in the pool.
    #[must_use]
    pub const fn stride_count(&self) -> u32 {
        (self.stride_max() - self.stride_min()) / self.stride_step + 1
    }

    /// Stride of class `class` (zero-based).
    #[must_use]
    pub const fn stride_at(&self, class: u32) -> u32 {
        debug_assert!(class < self.stride_count());
        self.stride_min() + class * self.stride_step
    }

    /// Block count of class `class`, produced by walking every pivot
    /// crossing up to it and applying the capacity function.
    #[must_use]
    pub const fn block_count_at(&self, class: u32) -> u32 {
        debug_assert!(class < self.stride_count());

        let mut count = self.base_block_count;
        let mut i = 1;
        while i <= class {
            if self.is_growth_pivot(self.stride_at(i)) {
                count = self.capacity_function.apply(count);
            }
            i += 1;
        }
        count
    }

    /// Total arena bytes this pool reserves: every class region plus one
    /// alignment's worth of carve slack per freelist.
    #[must_use]
    pub const fn reserved_bytes(&self) -> usize {
        let mut sum = 0usize;
        let mut class = 0;
        while class < self.stride_count() {
            sum += crate::freelist::region_bytes(self.stride_at(class), self.block_count_at(class));
            class += 1;
        }
        sum + self.stride_count() as usize * FREELIST_ALIGNMENT
    }

    const fn is_growth_pivot(&self, stride: u32) -> bool {
        let mut i = 1;
        while i < self.pivots.len() {
            if self.pivots[i] == stride {
                return true;
            }
            i += 1;
        }
        false
    }
}
