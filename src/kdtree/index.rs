use crate::axis::{AxisAccessor, IndexAxis};
use crate::error::Result;
use crate::kdtree::builder::{build_nodes, check_finite, ExternalSlots, OwnedSlots};
use crate::r#type::CoordNum;

/// Split metadata for one tree slot: the axis chosen at that slot and the
/// coordinate of the slot's element on that axis.
///
/// The node array is index-aligned 1:1 with the element array. Only internal
/// slots carry a meaningful plane; leaf slots keep a zeroed one that is never
/// consulted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitPlane<N> {
    /// The dimension this slot splits on.
    pub axis: usize,
    /// The coordinate of the split plane along `axis`.
    pub position: N,
}

impl<N: CoordNum> SplitPlane<N> {
    pub(crate) fn unset() -> Self {
        Self {
            axis: 0,
            position: N::zero(),
        }
    }
}

/// A KD tree that owns its elements.
///
/// Construction kd-sorts the element vector in place; the elements then live
/// inside the tree for its entire lifetime (reclaim them with
/// [`into_inner`][KDTree::into_inner]). Queries go through the
/// [`KDTreeIndex`][crate::kdtree::KDTreeIndex] trait.
#[derive(Debug, Clone)]
pub struct KDTree<T, const D: usize, A = IndexAxis>
where
    A: AxisAccessor<T, D>,
{
    pub(crate) elements: Vec<T>,
    pub(crate) nodes: Vec<SplitPlane<A::Num>>,
    pub(crate) accessor: A,
}

impl<T, const D: usize> KDTree<T, D>
where
    IndexAxis: AxisAccessor<T, D>,
{
    /// Create a tree from `elements` using the default indexed-access
    /// accessor.
    ///
    /// Coordinates must be finite; use [`try_new`][KDTree::try_new] to have
    /// that validated.
    pub fn new(elements: Vec<T>) -> Self {
        Self::with_accessor(elements, IndexAxis)
    }

    /// Create a tree from `elements`, validating every coordinate is finite
    /// first.
    pub fn try_new(elements: Vec<T>) -> Result<Self> {
        Self::try_with_accessor(elements, IndexAxis)
    }
}

impl<T, const D: usize, A: AxisAccessor<T, D>> KDTree<T, D, A> {
    /// Create a tree from `elements` with a caller-supplied coordinate
    /// accessor.
    pub fn with_accessor(mut elements: Vec<T>, accessor: A) -> Self {
        assert!(D > 0, "tree dimension must be nonzero");
        let nodes = {
            let mut slots: OwnedSlots<'_, T, A, D> = OwnedSlots {
                elements: &mut elements,
                accessor: &accessor,
            };
            build_nodes::<_, _, D>(&mut slots)
        };
        Self {
            elements,
            nodes,
            accessor,
        }
    }

    /// Like [`with_accessor`][KDTree::with_accessor], but validates every
    /// coordinate is finite before building.
    pub fn try_with_accessor(elements: Vec<T>, accessor: A) -> Result<Self> {
        check_finite::<_, _, D>(&elements, &accessor)?;
        Ok(Self::with_accessor(elements, accessor))
    }

    /// The elements in tree order.
    pub fn elements(&self) -> &[T] {
        &self.elements
    }

    /// Consume the tree, returning the elements in tree order.
    pub fn into_inner(self) -> Vec<T> {
        self.elements
    }
}

/// A KD tree over elements borrowed from the caller.
///
/// The borrowed slice is never reordered: the tree kd-sorts a private
/// permutation of indices into it instead, and queries hand back references
/// into the original collection. The collection must outlive the tree, which
/// the borrow enforces.
#[derive(Debug, Clone)]
pub struct KDTreeRef<'a, T, const D: usize, A = IndexAxis>
where
    A: AxisAccessor<T, D>,
{
    pub(crate) elements: &'a [T],
    pub(crate) order: Vec<u32>,
    pub(crate) nodes: Vec<SplitPlane<A::Num>>,
    pub(crate) accessor: A,
}

impl<'a, T, const D: usize> KDTreeRef<'a, T, D>
where
    IndexAxis: AxisAccessor<T, D>,
{
    /// Create a tree over `elements` using the default indexed-access
    /// accessor.
    ///
    /// Coordinates must be finite; use [`try_new`][KDTreeRef::try_new] to
    /// have that validated.
    pub fn new(elements: &'a [T]) -> Self {
        Self::with_accessor(elements, IndexAxis)
    }

    /// Create a tree over `elements`, validating every coordinate is finite
    /// first.
    pub fn try_new(elements: &'a [T]) -> Result<Self> {
        Self::try_with_accessor(elements, IndexAxis)
    }
}

impl<'a, T, const D: usize, A: AxisAccessor<T, D>> KDTreeRef<'a, T, D, A> {
    /// Create a tree over `elements` with a caller-supplied coordinate
    /// accessor.
    pub fn with_accessor(elements: &'a [T], accessor: A) -> Self {
        assert!(D > 0, "tree dimension must be nonzero");
        assert!(elements.len() <= u32::MAX.try_into().unwrap());
        let mut order: Vec<u32> = (0..elements.len() as u32).collect();
        let nodes = {
            let mut slots: ExternalSlots<'_, T, A, D> = ExternalSlots {
                elements,
                order: &mut order,
                accessor: &accessor,
            };
            build_nodes::<_, _, D>(&mut slots)
        };
        Self {
            elements,
            order,
            nodes,
            accessor,
        }
    }

    /// Like [`with_accessor`][KDTreeRef::with_accessor], but validates every
    /// coordinate is finite before building.
    pub fn try_with_accessor(elements: &'a [T], accessor: A) -> Result<Self> {
        check_finite::<_, _, D>(elements, &accessor)?;
        Ok(Self::with_accessor(elements, accessor))
    }

    /// The caller's collection, in its original order.
    pub fn elements(&self) -> &'a [T] {
        self.elements
    }

    /// The kd-sorted permutation: `indices()[slot]` is the position in the
    /// original collection of the element stored at `slot`.
    pub fn indices(&self) -> &[u32] {
        &self.order
    }
}
