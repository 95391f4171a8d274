use std::collections::{HashMap, HashSet, VecDeque};
use std::mem::size_of;
use std::sync::Arc;

/// Walks a model and sums the bytes it holds. Allocations reachable
/// through several `Arc`s are counted once per walk.
#[derive(Debug, Default)]
pub struct MemoryMeter {
    seen: HashSet<usize>,
}

impl MemoryMeter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total size of `value`, inline part included.
    pub fn measure_root<T: MemorySized + ?Sized>(value: &T) -> usize {
        let mut meter = MemoryMeter::new();
        value.inline_size() + value.extra_heap_size(&mut meter)
    }

    /// Heap bytes owned by a field. Its inline part is already covered by the
    /// owner's `inline_size`.
    pub fn measure_field<T: MemorySized + ?Sized>(&mut self, value: &T) -> usize {
        value.extra_heap_size(self)
    }

    fn first_visit<T: ?Sized>(&mut self, shared: &Arc<T>) -> bool {
        self.seen.insert(Arc::as_ptr(shared) as *const () as usize)
    }
}

/// Byte accounting for the pieces of a model.
pub trait MemorySized {
    /// Bytes occupied by the value itself.
    fn inline_size(&self) -> usize {
        std::mem::size_of_val(self)
    }

    /// Bytes owned behind pointers.
    fn extra_heap_size(&self, _meter: &mut MemoryMeter) -> usize {
        0
    }
}

macro_rules! plain_old_data {
    ($($t:ty),* $(,)?) => {
        $(impl MemorySized for $t {})*
    };
}

plain_old_data!(u8, u16, u32, u64, usize, i32, i64, f32, f64, bool, char);

impl MemorySized for String {
    fn extra_heap_size(&self, _meter: &mut MemoryMeter) -> usize {
        self.capacity()
    }
}

fn sequence_heap<'a, T: MemorySized + 'a>(
    capacity: usize,
    items: impl Iterator<Item = &'a T>,
    meter: &mut MemoryMeter,
) -> usize {
    capacity * size_of::<T>() + items.map(|item| item.extra_heap_size(meter)).sum::<usize>()
}

impl<T: MemorySized> MemorySized for Vec<T> {
    fn extra_heap_size(&self, meter: &mut MemoryMeter) -> usize {
        sequence_heap(self.capacity(), self.iter(), meter)
    }
}

impl<T: MemorySized> MemorySized for VecDeque<T> {
    fn extra_heap_size(&self, meter: &mut MemoryMeter) -> usize {
        sequence_heap(self.capacity(), self.iter(), meter)
    }
}

impl<T: MemorySized> MemorySized for Option<T> {
    fn extra_heap_size(&self, meter: &mut MemoryMeter) -> usize {
        self.as_ref().map_or(0, |value| value.extra_heap_size(meter))
    }
}

impl<T: MemorySized + ?Sized> MemorySized for Box<T> {
    fn inline_size(&self) -> usize {
        size_of::<Box<T>>()
    }

    fn extra_heap_size(&self, meter: &mut MemoryMeter) -> usize {
        let inner: &T = self;
        inner.inline_size() + inner.extra_heap_size(meter)
    }
}

impl<T: MemorySized + ?Sized> MemorySized for Arc<T> {
    fn inline_size(&self) -> usize {
        size_of::<Arc<T>>()
    }

    fn extra_heap_size(&self, meter: &mut MemoryMeter) -> usize {
        if !meter.first_visit(self) {
            return 0;
        }
        let inner: &T = self;
        inner.inline_size() + inner.extra_heap_size(meter)
    }
}

impl<K: MemorySized, V: MemorySized, S> MemorySized for HashMap<K, V, S> {
    fn extra_heap_size(&self, meter: &mut MemoryMeter) -> usize {
        self.capacity() * size_of::<(K, V)>()
            + self
                .iter()
                .map(|(k, v)| k.extra_heap_size(meter) + v.extra_heap_size(meter))
                .sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vec_counts_capacity_not_length() {
        let v: Vec<f64> = Vec::with_capacity(16);
        assert_eq!(
            MemoryMeter::measure_root(&v),
            size_of::<Vec<f64>>() + 16 * size_of::<f64>()
        );
    }

    #[test]
    fn nested_allocations_are_included() {
        let mut outer = Vec::with_capacity(2);
        outer.push(vec![0u32; 4]);
        let inner_heap = outer[0].capacity() * size_of::<u32>();
        assert_eq!(
            MemoryMeter::measure_root(&outer),
            size_of::<Vec<Vec<u32>>>() + 2 * size_of::<Vec<u32>>() + inner_heap
        );
    }

    #[test]
    fn shared_arc_is_counted_once() {
        let shared = Arc::new(vec![0u64; 8]);
        let once = MemoryMeter::measure_root(&vec![Arc::clone(&shared)]);
        let twice = MemoryMeter::measure_root(&vec![Arc::clone(&shared), Arc::clone(&shared)]);
        assert_eq!(twice - once, size_of::<Arc<Vec<u64>>>());
    }

    #[test]
    fn boxed_values_count_their_allocation() {
        let boxed: Box<u64> = Box::new(7);
        assert_eq!(
            MemoryMeter::measure_root(&boxed),
            size_of::<Box<u64>>() + size_of::<u64>()
        );
        assert_eq!(MemoryMeter::measure_root(&None::<Vec<u8>>), size_of::<Option<Vec<u8>>>());
    }
}
