//! Array operations: reservation, indexed load/store, null-terminated output.
//!
//! Layout for shape `[d1, d2, …, dk]`: the innermost dimension is a row of
//! `dk` value cells followed by four scratch cells; each outer dimension
//! wraps `dj` copies of the next-inner block, one zero separator after each.
//! Index `i` selects the (i+1)-th block from the right, so element
//! `[0][0]…[0]` sits next to the trailing scratch region and `putarr` can
//! stream it out until a zero byte.
//!
//! The target has no random access, so element addressing walks the index
//! down the array. Outer dimensions hop block-by-block: a small packet of
//! cells (the not-yet-consumed indices, plus the value for stores) slides
//! left one block per index decrement, landing only on the guaranteed-zero
//! separator and scratch cells, while a counter accumulates the hops for the
//! way back. The innermost dimension walks cell-by-cell with the classic
//! mirror-copy: each data cell is displaced four to the right as the packet
//! passes, and restored as the counter unwinds. After every operation all
//! scratch is zero again and the head is back on cell `dp`.

use super::{shift, spread_add, Emitter};

/// Total cells occupied by an array of the given shape, including the
/// per-dimension separators and the trailing four-cell scratch region.
pub fn footprint(shape: &[u32]) -> usize {
    let mut total = *shape.last().expect("empty array shape") as usize + 4;
    for &d in shape[..shape.len() - 1].iter().rev() {
        total = d as usize * (total + 1);
    }
    total
}

/// Distance between consecutive blocks of dimension `j` (0-based).
pub(crate) fn dim_stride(shape: &[u32], j: usize) -> usize {
    if j == shape.len() - 1 {
        1
    } else {
        footprint(&shape[j + 1..]) + 1
    }
}

impl Emitter {
    /// Reserve and zero the array's footprint above `dp`. Δdp = +footprint.
    pub fn push_multi_dim_array(&mut self, shape: &[u32]) {
        let total = footprint(shape);
        self.note(&format!("pusharr {}", total));
        for _ in 0..total {
            self.push("[-]>");
        }
        self.dp += total;
    }

    /// Consume `k` index cells (outermost index deepest, innermost on top)
    /// and push the element value. Δdp = 1 − k.
    pub fn multi_dim_load(&mut self, base: usize, shape: &[u32]) {
        let k = shape.len();
        let end = base + footprint(shape);
        assert!(k >= 1, "emitter: load from zero-rank array");
        assert!(
            end + k <= self.dp,
            "emitter: multi_dim_load base {} shape {:?} at dp {}",
            base,
            shape,
            self.dp
        );
        self.note(&format!("mdl {}", base));
        if k == 1 {
            self.load_element_1d(base + shape[0] as usize);
            return;
        }

        let dp = self.dp as isize;
        let ki = k as isize;
        let rpos = end as isize - dp;

        // Relocate the indices into the trailing zero zone: i_j -> end-1-j.
        for m in 1..=ki {
            self.out.push('<');
            self.push(&spread_add(&[rpos + 2 * m - ki - 2]));
        }
        self.push(&shift(rpos + ki - 2)); // head to i_1 at end-2

        // Descend: one hop loop per outer dimension. Each hop slides the
        // packet left by the block stride and bumps the return counter.
        for j in 0..k - 1 {
            let s = dim_stride(shape, j) as isize;
            let below = (k - 1 - j) as isize;
            self.push("[-");
            for b in 1..=below {
                self.push(&shift(-b));
                self.push(&spread_add(&[-s]));
                self.push(&shift(b));
            }
            self.push(&shift(1));
            self.push(&spread_add(&[-s]));
            self.push(&shift(-s));
            self.out.push('+');
            self.push(&shift(s - 1));
            self.push(&spread_add(&[-s]));
            self.push(&shift(-s));
            self.out.push(']');
            self.push(&shift(-1));
        }

        // Innermost walk: slide the index down beside the row, then the
        // mirror-copy fetch (displace right by 4, copy the element out,
        // unwind by the step counter).
        self.push(&spread_add(&[-2]));
        self.push(&shift(-2));
        self.push("[<[->>>>+<<<<]>-[-<+>]>[-<+>]<+<]");
        self.push("<[->+>>+<<<]>[-<+>]>");
        self.push("[>[->+<]<-[->+<]>>>[-<<<<+>>>>]<<]");

        // Return trip: hop back up one level at a time, the fetched value
        // riding two cells below each counter.
        self.push(&shift(3));
        for j in (0..k - 1).rev() {
            let s = dim_stride(shape, j) as isize;
            self.push("[-");
            self.push(&shift(-2));
            self.push(&spread_add(&[s]));
            self.push(&shift(2));
            self.push(&spread_add(&[s]));
            self.push(&shift(s));
            self.out.push(']');
            if j > 0 {
                self.push(&shift(-2));
                self.push(&spread_add(&[1]));
                self.push(&shift(3));
            }
        }

        // Collapse: the value becomes the new top of stack.
        self.push(&shift(-2));
        self.push(&spread_add(&[dp - end as isize + 3 - ki]));
        self.push(&shift(dp - ki + 1 - (end as isize - 3)));
        self.dp -= k - 1;
    }

    /// Consume `k` index cells and one value (value deepest, innermost index
    /// on top); write the element. Δdp = −(k + 1).
    pub fn multi_dim_store(&mut self, base: usize, shape: &[u32]) {
        let k = shape.len();
        let end = base + footprint(shape);
        assert!(k >= 1, "emitter: store to zero-rank array");
        assert!(
            end + k + 1 <= self.dp,
            "emitter: multi_dim_store base {} shape {:?} at dp {}",
            base,
            shape,
            self.dp
        );
        self.note(&format!("mds {}", base));
        if k == 1 {
            self.store_element_1d(base + shape[0] as usize);
            return;
        }

        let dp = self.dp as isize;
        let ki = k as isize;
        let rpos = end as isize - dp;

        // Relocate indices (i_j -> end-1-j), then the value below them.
        for m in 1..=ki {
            self.out.push('<');
            self.push(&spread_add(&[rpos + 2 * m - ki - 2]));
        }
        self.out.push('<');
        self.push(&spread_add(&[rpos - 1]));
        self.push(&shift(end as isize - 2 - (dp - ki - 1)));

        // Descend with the value riding at the bottom of the packet.
        for j in 0..k - 1 {
            let s = dim_stride(shape, j) as isize;
            let below = (k - 1 - j) as isize + 1;
            self.push("[-");
            for b in 1..=below {
                self.push(&shift(-b));
                self.push(&spread_add(&[-s]));
                self.push(&shift(b));
            }
            self.push(&shift(1));
            self.push(&spread_add(&[-s]));
            self.push(&shift(-s));
            self.out.push('+');
            self.push(&shift(s - 1));
            self.push(&spread_add(&[-s]));
            self.push(&shift(-s));
            self.out.push(']');
            self.push(&shift(-1));
        }

        // Innermost walk: arrange [index, counter, value] beside the row,
        // then the mirror-copy store (zero the element, deposit, unwind).
        self.push(&spread_add(&[-2]));
        self.push(&shift(-1));
        self.push(&spread_add(&[1]));
        self.push(&shift(-1));
        self.push("[-<[->>>>+<<<<]>[-<+>]>[-<+>]>[-<+>]<<+<]");
        self.push("<[-]>>>[-<<<+>>>]<");
        self.push("[->>>[-<<<<+>>>>]<<<[->+<]>]");

        // Return trip: counters only.
        self.push(&shift(3));
        for j in (0..k - 1).rev() {
            let s = dim_stride(shape, j) as isize;
            self.push("[-");
            self.push(&spread_add(&[s]));
            self.push(&shift(s));
            self.out.push(']');
            if j > 0 {
                self.push(&shift(1));
            }
        }

        self.push(&shift(dp - ki - 1 - (end as isize - 1)));
        self.dp -= k + 1;
    }

    /// Emit the element row holding `[0][0]…[0]` as bytes until a zero byte.
    /// Δdp = 0.
    pub fn put_array(&mut self, base: usize, shape: &[u32]) {
        let end = base + footprint(shape);
        assert!(end <= self.dp, "emitter: put_array base {} at dp {}", base, self.dp);
        self.note(&format!("puta {}", base));
        let start = end as isize - 4 - (shape.len() as isize - 1);
        self.push(&shift(start - self.dp as isize));
        self.push("<[.<]>[>]");
        self.push(&shift(self.dp as isize - start));
    }

    /// One-dimensional fetch, index on top: the packet is just the index and
    /// the step counter, walking straight down the row. `pos` is one past
    /// the data row.
    fn load_element_1d(&mut self, pos: usize) {
        assert!(pos < self.dp);
        let rpos = pos as isize - self.dp as isize;
        self.push(&shift(rpos));
        self.push("[-]>[-]>[-]>[-]");
        self.push(&shift(-rpos - 4));
        self.push(&spread_add(&[rpos + 1]));
        self.push(&shift(rpos + 1));
        self.push("[<[->>>>+<<<<]>-[-<+>]>[-<+>]<+<]");
        self.push("<[->+>>+<<<]>[-<+>]>");
        self.push("[>[->+<]<-[->+<]>>>[-<<<<+>>>>]<<]");
        self.out.push('>');
        self.push(&spread_add(&[-rpos - 3]));
        self.push(&shift(-rpos - 2));
    }

    /// One-dimensional store, value below the index.
    fn store_element_1d(&mut self, pos: usize) {
        assert!(self.dp > 1 && pos < self.dp);
        let rpos = pos as isize - self.dp as isize;
        self.push(&shift(rpos));
        self.push("[-]>[-]>[-]>[-]");
        self.push(&shift(-rpos - 5));
        self.push(&spread_add(&[rpos + 4]));
        self.out.push('>');
        self.push(&spread_add(&[rpos + 1]));
        self.push(&shift(rpos + 1));
        self.push("[-<[->>>>+<<<<]>[-<+>]>[-<+>]>[-<+>]<<+<]");
        self.push("<[-]>>>[-<<<+>>>]<");
        self.push("[->>>[-<<<<+>>>>]<<<[->+<]>]");
        self.push(&shift(-rpos - 3));
        self.dp -= 2;
    }
}
