use alloc::vec;
use alloc::vec::Vec;

/// 位图组，每组 64 位
type BitmapGroup = u64;

const GROUP_BITS: usize = BitmapGroup::BITS as usize;

/// 位图，记录其指示区域的块分配情况
#[derive(Debug, Clone)]
pub struct Bitmap {
    groups: Vec<BitmapGroup>,
    /// 位图可编号的总数
    capacity: usize,
}

/// 位编号
struct BitID(usize);

impl Bitmap {
    pub fn new(capacity: usize) -> Self {
        let mut groups = vec![0; capacity.div_ceil(GROUP_BITS)];

        // 末组超出容量的位预先占满，分配时永远不会落到这些位上
        let tail = capacity % GROUP_BITS;
        if let Some(last) = groups.last_mut().filter(|_| tail != 0) {
            *last = BitmapGroup::MAX << tail;
        }

        Self { groups, capacity }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// 分配编号最小的空闲位，返回其编号。
    /// 若位图的空间用尽，则返回空。
    pub fn alloc(&mut self) -> Option<usize> {
        let (group_index, ingroup_index) =
            self.groups
                .iter()
                .enumerate()
                .find_map(|(group_index, &bits)| {
                    (bits != BitmapGroup::MAX)
                        .then_some((group_index, bits.trailing_ones() as usize))
                })?;

        self.groups[group_index] |= 1 << ingroup_index;
        Some(BitID::encode(group_index, ingroup_index))
    }

    pub fn dealloc(&mut self, bit: usize) {
        assert!(bit < self.capacity, "bit {bit} out of bitmap");
        let (group_index, ingroup_index) = BitID(bit).decode();

        // 编号一定得有对应的位
        assert_ne!(
            self.groups[group_index] & (1 << ingroup_index),
            0,
            "bit {bit} is already free"
        );

        self.groups[group_index] -= 1 << ingroup_index;
    }

    #[inline]
    pub fn is_set(&self, bit: usize) -> bool {
        if bit >= self.capacity {
            return false;
        }
        let (group_index, ingroup_index) = BitID(bit).decode();
        self.groups[group_index] & (1 << ingroup_index) != 0
    }

    /// 已占用的位数
    pub fn count_set(&self) -> usize {
        let padding = self.groups.len() * GROUP_BITS - self.capacity;
        self.groups
            .iter()
            .map(|bits| bits.count_ones() as usize)
            .sum::<usize>()
            - padding
    }
}

impl BitID {
    #[inline]
    fn encode(group_index: usize, ingroup_index: usize) -> usize {
        group_index * GROUP_BITS + ingroup_index
    }

    #[inline]
    fn decode(self) -> (usize, usize) {
        (self.0 / GROUP_BITS, self.0 % GROUP_BITS)
    }
}
