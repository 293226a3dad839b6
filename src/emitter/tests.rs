use super::array::dim_stride;
use super::*;
use crate::interp::{execute, Summary};

fn run(code: &str) -> (String, Summary) {
    run_with_input(code, "")
}

fn run_with_input(code: &str, input: &str) -> (String, Summary) {
    let mut input = input.as_bytes();
    let mut output = Vec::new();
    let summary = execute(code, &mut input, &mut output, Some(100_000_000))
        .expect("emitted code crashed the interpreter");
    (String::from_utf8_lossy(&output).into_owned(), summary)
}

/// Head must rest on cell `dp`, the listed cells must match, and everything
/// past them must be zero.
fn assert_tape(e: &Emitter, summary: &Summary, expect: &[u8]) {
    assert_eq!(summary.head, e.dp(), "head is not on cell dp");
    assert_eq!(
        &summary.tape[..expect.len()],
        expect,
        "live tape region mismatch"
    );
    assert!(
        summary.tape[expect.len()..].iter().all(|&c| c == 0),
        "cells beyond the expectation are not zero"
    );
}

const GRID: &[u32] = &[0, 1, 2, 5, 9, 10, 100, 127, 128, 200, 254, 255];

// ── value stack ──

#[test]
fn test_load_constant() {
    let mut e = Emitter::new();
    e.load_constant(b'@' as u32);
    let (_, s) = run(e.code());
    assert_tape(&e, &s, &[b'@']);
}

#[test]
fn test_load_constant_wraps() {
    let mut e = Emitter::new();
    e.load_constant(300);
    let (_, s) = run(e.code());
    assert_tape(&e, &s, &[44]);
}

#[test]
fn test_load_variable_preserves_source() {
    let mut e = Emitter::new();
    e.load_constant(b'a' as u32);
    e.load_variable(0);
    let (_, s) = run(e.code());
    assert_tape(&e, &s, &[b'a', b'a']);
}

#[test]
fn test_store_variable() {
    let mut e = Emitter::new();
    e.load_constant(b'a' as u32);
    e.load_constant(b'b' as u32);
    e.load_constant(b'c' as u32);
    e.store_variable(0);
    let (_, s) = run(e.code());
    assert_tape(&e, &s, &[b'c', b'b']);
}

#[test]
fn test_pop_zeroes_cells() {
    let mut e = Emitter::new();
    e.load_constant(1);
    e.load_constant(2);
    e.load_constant(3);
    e.pop(2);
    let (_, s) = run(e.code());
    assert_tape(&e, &s, &[1]);
}

#[test]
fn test_pop_zero_is_a_no_op() {
    let mut e = Emitter::new();
    e.load_constant(9);
    let before = e.dp();
    let len = e.code().len();
    e.pop(0);
    assert_eq!(e.dp(), before);
    assert_eq!(e.code().len(), len);
}

// ── arithmetic over a value grid ──

#[test]
fn test_add_subtract_grid() {
    for &x in GRID {
        for &y in GRID {
            let mut e = Emitter::new();
            e.load_constant(x);
            e.load_constant(y);
            e.add();
            let (_, s) = run(e.code());
            assert_tape(&e, &s, &[(x + y) as u8]);

            let mut e = Emitter::new();
            e.load_constant(x);
            e.load_constant(y);
            e.subtract();
            let (_, s) = run(e.code());
            assert_tape(&e, &s, &[(x.wrapping_sub(y)) as u8]);
        }
    }
}

#[test]
fn test_multiply_grid() {
    for &x in GRID {
        for &y in GRID {
            let mut e = Emitter::new();
            e.load_constant(x);
            e.load_constant(y);
            e.multiply();
            let (_, s) = run(e.code());
            assert_tape(&e, &s, &[(x * y) as u8]);
        }
    }
}

#[test]
fn test_divide_modulo_grid() {
    for &x in GRID {
        for &y in GRID {
            if y == 0 {
                continue;
            }
            let mut e = Emitter::new();
            e.load_constant(x);
            e.load_constant(y);
            e.divide();
            let (_, s) = run(e.code());
            assert_tape(&e, &s, &[(x / y) as u8]);

            let mut e = Emitter::new();
            e.load_constant(x);
            e.load_constant(y);
            e.modulo();
            let (_, s) = run(e.code());
            assert_tape(&e, &s, &[(x % y) as u8]);
        }
    }
}

// ── comparisons and booleans ──

#[test]
fn test_comparison_grid() {
    type Case = (fn(&mut Emitter), fn(u32, u32) -> bool);
    let cases: &[Case] = &[
        (|e| e.equal(), |x, y| x == y),
        (|e| e.notequal(), |x, y| x != y),
        (|e| e.less_than(), |x, y| x < y),
        (|e| e.greater_than(), |x, y| x > y),
        (|e| e.less_or_equal(), |x, y| x <= y),
        (|e| e.greater_or_equal(), |x, y| x >= y),
    ];
    for (emit, model) in cases {
        for &x in GRID {
            for &y in GRID {
                let mut e = Emitter::new();
                e.load_constant(x);
                e.load_constant(y);
                emit(&mut e);
                let (_, s) = run(e.code());
                assert_tape(&e, &s, &[model(x, y) as u8]);
            }
        }
    }
}

#[test]
fn test_boolean_ops() {
    for &x in &[0u32, 1, 2, 200] {
        let mut e = Emitter::new();
        e.load_constant(x);
        e.boolean();
        let (_, s) = run(e.code());
        assert_tape(&e, &s, &[(x != 0) as u8]);

        let mut e = Emitter::new();
        e.load_constant(x);
        e.boolnot();
        let (_, s) = run(e.code());
        assert_tape(&e, &s, &[(x == 0) as u8]);

        for &y in &[0u32, 1, 7] {
            let mut e = Emitter::new();
            e.load_constant(x);
            e.load_constant(y);
            e.boolor();
            let (_, s) = run(e.code());
            assert_tape(&e, &s, &[(x != 0 || y != 0) as u8]);

            let mut e = Emitter::new();
            e.load_constant(x);
            e.load_constant(y);
            e.booland();
            let (_, s) = run(e.code());
            assert_tape(&e, &s, &[(x != 0 && y != 0) as u8]);
        }
    }
}

// ── I/O and control ──

#[test]
fn test_put_get_character() {
    let mut e = Emitter::new();
    e.load_constant(b'@' as u32);
    e.put_character();
    let (out, s) = run(e.code());
    assert_eq!(out, "@");
    assert_tape(&e, &s, &[]);

    let mut e = Emitter::new();
    e.get_character();
    let (_, s) = run_with_input(e.code(), "@");
    assert_tape(&e, &s, &[b'@']);
}

#[test]
fn test_while_alphabet() {
    let mut e = Emitter::new();
    e.load_constant(b'A' as u32);
    e.load_variable(0);
    e.put_character();
    e.load_variable(0);
    e.load_constant(b'Z' as u32);
    e.notequal();
    e.begin_while();
    e.load_variable(0);
    e.load_constant(1);
    e.add();
    e.store_variable(0);
    e.load_variable(0);
    e.load_constant(b'Z' as u32);
    e.notequal();
    e.load_variable(0);
    e.put_character();
    e.end_while();
    let (out, s) = run(e.code());
    assert_eq!(out, "ABCDEFGHIJKLMNOPQRSTUVWXYZ");
    assert_tape(&e, &s, &[b'Z']);
}

#[test]
fn test_while_echo_until_newline() {
    let text = "This is an input string.\n";
    let mut e = Emitter::new();
    e.get_character();
    e.load_variable(0);
    e.put_character();
    e.load_constant(b'\n' as u32);
    e.notequal();
    e.begin_while();
    e.get_character();
    e.load_variable(0);
    e.put_character();
    e.load_constant(b'\n' as u32);
    e.notequal();
    e.end_while();
    let (out, s) = run_with_input(e.code(), text);
    assert_eq!(out, text);
    assert_tape(&e, &s, &[]);
}

#[test]
fn test_if_both_branches() {
    for (cond, expect) in [(1u32, "T"), (0u32, "F")] {
        let mut e = Emitter::new();
        e.load_constant(cond);
        e.begin_if();
        e.load_constant(b'T' as u32);
        e.put_character();
        e.begin_else();
        e.load_constant(b'F' as u32);
        e.put_character();
        e.end_if();
        let (out, s) = run(e.code());
        assert_eq!(out, expect);
        assert_tape(&e, &s, &[]);
    }
}

#[test]
fn test_if_with_empty_else() {
    for (cond, expect) in [(1u32, "Y"), (0u32, "")] {
        let mut e = Emitter::new();
        e.load_constant(cond);
        e.begin_if();
        e.load_constant(b'Y' as u32);
        e.put_character();
        e.begin_else();
        e.end_if();
        let (out, s) = run(e.code());
        assert_eq!(out, expect);
        assert_tape(&e, &s, &[]);
    }
}

#[test]
fn test_gcd_by_subtraction() {
    let (x, y) = (36u32, 12u32);
    let mut e = Emitter::new();
    e.load_constant(x);
    e.load_constant(y);
    e.load_variable(0);
    e.begin_while();
    e.load_variable(0);
    e.load_variable(1);
    e.less_than();
    e.begin_if();
    e.load_variable(0);
    e.load_variable(1);
    e.store_variable(0);
    e.store_variable(1);
    e.begin_else();
    e.end_if();
    e.load_variable(0);
    e.load_variable(1);
    e.subtract();
    e.store_variable(0);
    e.load_variable(0);
    e.end_while();
    e.load_variable(1);
    e.load_constant(b'0' as u32);
    e.add();
    e.put_character();
    let (out, s) = run(e.code());
    assert_eq!(out.as_bytes(), &[b'0' + 12]);
    assert_tape(&e, &s, &[0, 12]);
}

// ── arrays ──

/// Cell offset from the array base for an element (blocks are selected from
/// the right at each level).
fn element_cell(shape: &[u32], indices: &[u32]) -> usize {
    let mut cell = 0;
    for (j, &i) in indices.iter().enumerate() {
        cell += (shape[j] - 1 - i) as usize * dim_stride(shape, j);
    }
    cell
}

fn cartesian(shape: &[u32]) -> Vec<Vec<u32>> {
    let mut all = vec![vec![]];
    for &d in shape {
        let mut next = Vec::new();
        for prefix in &all {
            for i in 0..d {
                let mut item = prefix.clone();
                item.push(i);
                next.push(item);
            }
        }
        all = next;
    }
    all
}

#[test]
fn test_one_dim_store_and_load() {
    let d = 6u32;
    let mut e = Emitter::new();
    let base = e.dp();
    e.push_multi_dim_array(&[d]);
    for i in 0..d {
        e.load_constant(i + 30);
        e.load_constant(i);
        e.multi_dim_store(base, &[d]);
    }
    for i in 0..d {
        e.load_constant(i);
        e.multi_dim_load(base, &[d]);
    }
    let (_, s) = run(e.code());
    let mut expect = vec![0u8; d as usize + 4];
    for i in 0..d {
        expect[element_cell(&[d], &[i])] = (i + 30) as u8;
    }
    expect.extend((0..d).map(|i| (i + 30) as u8));
    assert_tape(&e, &s, &expect);
}

/// Store a distinct value at every element, then load every element back.
fn exercise_shape(shape: &[u32]) {
    let mut e = Emitter::new();
    e.load_constant(77); // junk below the array, must survive untouched
    let base = e.dp();
    e.push_multi_dim_array(shape);

    for (count, idx) in cartesian(shape).iter().enumerate() {
        e.load_constant(10 + count as u32);
        for &i in idx {
            e.load_constant(i);
        }
        e.multi_dim_store(base, shape);
    }
    for idx in &cartesian(shape) {
        for &i in idx {
            e.load_constant(i);
        }
        e.multi_dim_load(base, shape);
        e.pop(1);
    }
    // reload one corner element and leave it on the stack
    let probe: Vec<u32> = shape.iter().map(|&d| d - 1).collect();
    for &i in &probe {
        e.load_constant(i);
    }
    e.multi_dim_load(base, shape);

    let (_, s) = run(e.code());
    let mut expect = vec![0u8; 1 + footprint(shape)];
    expect[0] = 77;
    let mut probe_value = 0u8;
    for (count, idx) in cartesian(shape).iter().enumerate() {
        let value = (10 + count) as u8;
        expect[1 + element_cell(shape, idx)] = value;
        if *idx == probe {
            probe_value = value;
        }
    }
    expect.push(probe_value);
    assert_tape(&e, &s, &expect);
}

#[test]
fn test_two_dims() {
    exercise_shape(&[4, 3]);
}

#[test]
fn test_three_dims() {
    exercise_shape(&[5, 4, 3]);
}

#[test]
fn test_four_dims() {
    exercise_shape(&[2, 2, 2, 2]);
}

#[test]
fn test_unit_dimensions() {
    exercise_shape(&[1, 1, 1]);
    exercise_shape(&[3, 1, 2]);
}

#[test]
fn test_indices_loaded_from_variables() {
    let shape = &[4u32, 3];
    let mut e = Emitter::new();
    e.load_constant(2);
    e.load_constant(1);
    let base = e.dp();
    e.push_multi_dim_array(shape);
    e.load_constant(123);
    e.load_variable(0);
    e.load_variable(1);
    e.multi_dim_store(base, shape);
    e.load_variable(0);
    e.load_variable(1);
    e.multi_dim_load(base, shape);
    let (_, s) = run(e.code());
    let mut expect = vec![0u8; 2 + footprint(shape)];
    expect[0] = 2;
    expect[1] = 1;
    expect[2 + element_cell(shape, &[2, 1])] = 123;
    expect.push(123);
    assert_tape(&e, &s, &expect);
}

#[test]
fn test_put_array_streams_until_zero() {
    let text = "voidhoge";
    let d = text.len() as u32 + 1;
    let mut e = Emitter::new();
    let base = e.dp();
    e.push_multi_dim_array(&[d]);
    for (i, ch) in text.bytes().enumerate() {
        e.load_constant(ch as u32);
        e.load_constant(i as u32);
        e.multi_dim_store(base, &[d]);
    }
    e.put_array(base, &[d]);
    let (out, s) = run(e.code());
    assert_eq!(out, text);
    assert_eq!(s.head, e.dp());
}

#[test]
fn test_put_array_multi_dim_first_row() {
    let shape = &[3u32, 5];
    let mut e = Emitter::new();
    let base = e.dp();
    e.push_multi_dim_array(shape);
    for (i, ch) in "Hi".bytes().enumerate() {
        e.load_constant(ch as u32);
        e.load_constant(0);
        e.load_constant(i as u32);
        e.multi_dim_store(base, shape);
    }
    e.put_array(base, shape);
    let (out, s) = run(e.code());
    assert_eq!(out, "Hi");
    assert_eq!(s.head, e.dp());
}

// ── precondition assertions are compiler bugs, not user errors ──

#[test]
#[should_panic(expected = "end_while without begin_while")]
fn test_end_while_unpaired_panics() {
    let mut e = Emitter::new();
    e.load_constant(1);
    e.end_while();
}

#[test]
#[should_panic(expected = "emitter: add at dp 1")]
fn test_add_underflow_panics() {
    let mut e = Emitter::new();
    e.load_constant(1);
    e.add();
}

#[test]
#[should_panic(expected = "emitter: pop(3) at dp 1")]
fn test_pop_too_deep_panics() {
    let mut e = Emitter::new();
    e.load_constant(1);
    e.pop(3);
}

#[test]
#[should_panic(expected = "end_if closes While")]
fn test_mismatched_frames_panic() {
    let mut e = Emitter::new();
    e.load_constant(1);
    e.load_constant(1);
    e.begin_while();
    e.load_constant(1);
    e.load_constant(1);
    e.end_if();
}

#[test]
#[should_panic(expected = "unclosed control frame")]
fn test_finish_with_open_frame_panics() {
    let mut e = Emitter::new();
    e.load_constant(1);
    e.begin_while();
    e.finish();
}

#[test]
fn test_footprint_recurrence() {
    assert_eq!(footprint(&[6]), 10);
    assert_eq!(footprint(&[3]), 7);
    assert_eq!(footprint(&[4, 3]), 32);
    assert_eq!(footprint(&[5, 4, 3]), 165);
    assert_eq!(footprint(&[2, 2, 2]), 30);
}

#[test]
fn test_annotations_use_no_primitive_characters() {
    let mut e = Emitter::with_annotations();
    e.load_constant(65);
    e.load_variable(0);
    e.load_constant(2);
    e.greater_or_equal();
    e.pop(1);
    let annotated = e.code().to_string();

    let mut plain = Emitter::new();
    plain.load_constant(65);
    plain.load_variable(0);
    plain.load_constant(2);
    plain.greater_or_equal();
    plain.pop(1);

    let strip = |s: &str| {
        s.chars()
            .filter(|c| "><+-.,[]".contains(*c))
            .collect::<String>()
    };
    assert_eq!(strip(&annotated), strip(plain.code()));
    assert_ne!(annotated, *plain.code());
}
