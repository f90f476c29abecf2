use std::collections::BinaryHeap;

use num_traits::{Float, Zero};
use tinyvec::TinyVec;

use crate::axis::AxisAccessor;
use crate::kdtree::index::{KDTree, KDTreeRef, SplitPlane};
use crate::r#type::CoordNum;

/// A trait for searching a KD tree, shared by the owning and borrowing
/// storage modes.
///
/// Queries are read-only: they take `&self` and keep all working state (the
/// candidate heap, the traversal stack) local, so a built tree can serve
/// concurrent queries from many threads without synchronization.
pub trait KDTreeIndex<T, const D: usize> {
    /// The coordinate scalar type.
    type Num: CoordNum;

    /// The number of dimensions of the point space.
    const DIMENSIONS: usize = D;

    /// The number of indexed elements.
    fn len(&self) -> usize;

    /// Whether the tree indexes no elements.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The element stored at a tree slot.
    fn get(&self, slot: usize) -> &T;

    /// The split plane recorded at a tree slot.
    ///
    /// Only internal slots carry a meaningful plane.
    fn split(&self, slot: usize) -> SplitPlane<Self::Num>;

    /// The coordinate on `axis` of the element stored at `slot`.
    fn coord(&self, slot: usize, axis: usize) -> Self::Num;

    /// The single nearest element to `point`, if the tree is not empty.
    fn nearest(&self, point: &[Self::Num; D]) -> Option<&T> {
        self.nearest_neighbors(point, 1, None).pop()
    }

    /// The `k` elements closest to `point`, nearest first.
    ///
    /// With `max_radius` set, elements farther than the radius are excluded
    /// even when fewer than `k` are found. The result is shorter than `k`
    /// when the tree holds fewer eligible elements; `k == 0` and the empty
    /// tree return an empty vector.
    ///
    /// ```
    /// use point_index::kdtree::{KDTree, KDTreeIndex};
    ///
    /// let tree: KDTree<[f64; 2], 2> = KDTree::new(vec![[0., 0.], [2., 2.], [4., 4.]]);
    ///
    /// let results = tree.nearest_neighbors(&[5., 5.], 2, None);
    /// assert_eq!(results, vec![&[4., 4.], &[2., 2.]]);
    ///
    /// let results = tree.nearest_neighbors(&[5., 5.], 2, Some(2.0));
    /// assert_eq!(results, vec![&[4., 4.]]);
    /// ```
    fn nearest_neighbors(
        &self,
        point: &[Self::Num; D],
        k: usize,
        max_radius: Option<Self::Num>,
    ) -> Vec<&T> {
        if k == 0 || self.is_empty() {
            return vec![];
        }

        let max_sq_dist = max_radius.map(|r| r * r);
        let mut heap: BinaryHeap<Candidate<Self::Num>> =
            BinaryHeap::with_capacity(k.min(self.len()));
        search(self, point, 0, self.len(), k, max_sq_dist, &mut heap);

        heap.into_sorted_vec()
            .into_iter()
            .map(|candidate| self.get(candidate.slot))
            .collect()
    }

    /// All elements within `radius` of `point`, in traversal order.
    fn within(&self, point: &[Self::Num; D], radius: Self::Num) -> Vec<&T> {
        let mut results = vec![];
        if self.is_empty() {
            return results;
        }
        let r2 = radius * radius;

        // Use TinyVec to avoid heap allocations
        let mut stack: TinyVec<[(usize, usize); 32]> = TinyVec::new();
        stack.push((0, self.len()));

        while let Some((left, right)) = stack.pop() {
            // single leaf: test its element directly
            if right - left <= 1 {
                if right > left && sq_dist(self, point, left) <= r2 {
                    results.push(self.get(left));
                }
                continue;
            }

            let m = (left + right) >> 1;
            if sq_dist(self, point, m) <= r2 {
                results.push(self.get(m));
            }

            // queue the halves the radius can reach
            let SplitPlane { axis, position } = self.split(m);
            let q = point[axis];
            if q - radius <= position {
                stack.push((left, m));
            }
            if q + radius >= position {
                stack.push((m + 1, right));
            }
        }

        results
    }
}

impl<T, const D: usize, A: AxisAccessor<T, D>> KDTreeIndex<T, D> for KDTree<T, D, A> {
    type Num = A::Num;

    fn len(&self) -> usize {
        self.elements.len()
    }

    #[inline]
    fn get(&self, slot: usize) -> &T {
        &self.elements[slot]
    }

    #[inline]
    fn split(&self, slot: usize) -> SplitPlane<A::Num> {
        self.nodes[slot]
    }

    #[inline]
    fn coord(&self, slot: usize, axis: usize) -> A::Num {
        self.accessor.coord(&self.elements[slot], axis)
    }
}

impl<T, const D: usize, A: AxisAccessor<T, D>> KDTreeIndex<T, D> for KDTreeRef<'_, T, D, A> {
    type Num = A::Num;

    fn len(&self) -> usize {
        self.order.len()
    }

    #[inline]
    fn get(&self, slot: usize) -> &T {
        &self.elements[self.order[slot] as usize]
    }

    #[inline]
    fn split(&self, slot: usize) -> SplitPlane<A::Num> {
        self.nodes[slot]
    }

    #[inline]
    fn coord(&self, slot: usize, axis: usize) -> A::Num {
        self.accessor.coord(self.get(slot), axis)
    }
}

/// A kept candidate and its squared distance, ordered worst-first so a
/// max-heap of capacity `k` holds the best `k` seen so far.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Candidate<N: CoordNum> {
    sq_dist: N,
    slot: usize,
}

impl<N: CoordNum> Eq for Candidate<N> {}

impl<N: CoordNum> Ord for Candidate<N> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // We don't allow NaN. This should only panic on NaN
        self.sq_dist
            .partial_cmp(&other.sq_dist)
            .unwrap()
            .then_with(|| self.slot.cmp(&other.slot))
    }
}

impl<N: CoordNum> PartialOrd for Candidate<N> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Branch-and-bound descent over the half-open range `[left, right)`.
fn search<T, const D: usize, I>(
    index: &I,
    point: &[I::Num; D],
    left: usize,
    right: usize,
    k: usize,
    max_sq_dist: Option<I::Num>,
    heap: &mut BinaryHeap<Candidate<I::Num>>,
) where
    I: KDTreeIndex<T, D> + ?Sized,
{
    if right == left {
        return;
    }
    if right - left == 1 {
        consider(index, point, left, k, max_sq_dist, heap);
        return;
    }

    // The middle slot stores an element of its own, not just a routing
    // plane.
    let m = (left + right) >> 1;
    consider(index, point, m, k, max_sq_dist, heap);

    let SplitPlane { axis, position } = index.split(m);
    let q = point[axis];

    // Descend the half the query point falls in before judging the other.
    let (near, far) = if q <= position {
        ((left, m), (m + 1, right))
    } else {
        ((m + 1, right), (left, m))
    };
    search(index, point, near.0, near.1, k, max_sq_dist, heap);

    // Everything in the far half is at least `delta` away along the split
    // axis; skip it when that already rules out an improvement.
    let delta = (q - position).abs();
    let sq_delta = delta * delta;
    if let Some(r2) = max_sq_dist {
        if sq_delta > r2 {
            return;
        }
    }
    let improves = heap.len() < k
        || heap
            .peek()
            .map_or(true, |worst| sq_delta < worst.sq_dist);
    if improves {
        search(index, point, far.0, far.1, k, max_sq_dist, heap);
    }
}

/// Test one slot against the query, keeping it when it beats the current
/// worst kept candidate (or the collection is not yet full) and lies within
/// the radius bound.
#[inline]
fn consider<T, const D: usize, I>(
    index: &I,
    point: &[I::Num; D],
    slot: usize,
    k: usize,
    max_sq_dist: Option<I::Num>,
    heap: &mut BinaryHeap<Candidate<I::Num>>,
) where
    I: KDTreeIndex<T, D> + ?Sized,
{
    let sq_dist = sq_dist(index, point, slot);
    if let Some(r2) = max_sq_dist {
        if sq_dist > r2 {
            return;
        }
    }

    let candidate = Candidate { sq_dist, slot };
    if heap.len() < k {
        heap.push(candidate);
    } else if let Some(worst) = heap.peek() {
        if candidate < *worst {
            heap.pop();
            heap.push(candidate);
        }
    }
}

/// Squared Euclidean distance between the query point and the element at
/// `slot`.
#[inline]
fn sq_dist<T, const D: usize, I>(index: &I, point: &[I::Num; D], slot: usize) -> I::Num
where
    I: KDTreeIndex<T, D> + ?Sized,
{
    let mut acc = I::Num::zero();
    for axis in 0..D {
        let d = index.coord(slot, axis) - point[axis];
        acc = acc + d * d;
    }
    acc
}
