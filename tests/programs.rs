//! End-to-end tests: compile whole programs and execute them on the
//! reference interpreter, plus the command-line driver itself.

use std::io::Write;
use std::process::{Command, Stdio};

use tapec::interp::execute;

fn run(source: &str, input: &str) -> String {
    let output = tapec::compile(source).expect("compile error");
    let mut input = input.as_bytes();
    let mut out = Vec::new();
    let summary = execute(&output.code, &mut input, &mut out, Some(500_000_000))
        .expect("generated program crashed");
    assert_eq!(summary.head, 0);
    assert!(summary.tape.iter().all(|&c| c == 0));
    String::from_utf8_lossy(&out).into_owned()
}

#[test]
fn test_hello_world() {
    let src = r#"
        s[14];
        s[0] = 'H'; s[1] = 'e'; s[2] = 'l'; s[3] = 'l'; s[4] = 'o';
        s[5] = ','; s[6] = ' ';
        s[7] = 'w'; s[8] = 'o'; s[9] = 'r'; s[10] = 'l'; s[11] = 'd';
        s[12] = '!';
        putarr(s);
        putchar('\n');
    "#;
    assert_eq!(run(src, ""), "Hello, world!\n");
}

#[test]
fn test_fibonacci_sequence() {
    let src = "
        a = 0; b = 1;
        for (n = 0; n < 10; n = n + 1) {
            putint(a);
            putchar(' ');
            t = a + b;
            a = b;
            b = t;
        }
        putchar('\\n');
    ";
    assert_eq!(run(src, ""), "0 1 1 2 3 5 8 13 21 34 \n");
}

#[test]
fn test_factorization() {
    // trial division, printing each prime factor
    let src = "
        n = getint();
        d = 2;
        while (n != 1) {
            if (n % d) {
                d = d + 1;
            } else {
                n = n / d;
                putint(d);
                putchar(' ');
            }
        }
        putchar('\\n');
    ";
    assert_eq!(run(src, "192\n"), "2 2 2 2 2 2 3 \n");
    assert_eq!(run(src, "97\n"), "97 \n");
}

#[test]
fn test_bubble_sort() {
    let src = "
        v[5];
        v[0] = 40; v[1] = 3; v[2] = 250; v[3] = 17; v[4] = 9;
        for (i = 0; i < 4; i = i + 1) {
            for (j = 0; j < 4 - i; j = j + 1) {
                if (v[j] > v[j + 1]) {
                    swap(v[j], v[j + 1]);
                }
            }
        }
        for (i = 0; i < 5; i = i + 1) { putint(v[i]); putchar(' '); }
    ";
    assert_eq!(run(src, ""), "3 9 17 40 250 ");
}

#[test]
fn test_reverse_echo_line() {
    let src = "
        buf[40];
        n = 0;
        c = getchar();
        while (c != '\\n') {
            buf[n] = c;
            n = n + 1;
            c = getchar();
        }
        while (n) {
            n = n - 1;
            putchar(buf[n]);
        }
        putchar('\\n');
    ";
    assert_eq!(run(src, "stressed\n"), "desserts\n");
}

#[test]
fn test_two_dim_grid_sums() {
    let src = "
        m[3][3];
        for (i = 0; i < 3; i = i + 1) {
            for (j = 0; j < 3; j = j + 1) {
                m[i][j] = i * 3 + j;
            }
        }
        for (i = 0; i < 3; i = i + 1) {
            row = 0;
            for (j = 0; j < 3; j = j + 1) { row += m[i][j]; }
            putint(row);
            putchar(' ');
        }
    ";
    assert_eq!(run(src, ""), "3 12 21 ");
}

#[test]
fn test_three_dim_array() {
    let src = "
        t[2][3][4];
        t[1][2][3] = 77;
        t[0][1][2] = 5;
        putint(t[1][2][3] + t[0][1][2]);
    ";
    assert_eq!(run(src, ""), "82");
}

#[test]
fn test_logical_operators_in_conditions() {
    let src = "
        for (i = 0; i < 8; i = i + 1) {
            if (i % 2 == 0 & i != 4) { putint(i); }
        }
    ";
    assert_eq!(run(src, ""), "026");
}

#[test]
fn test_countdown_with_compound_ops() {
    let src = "
        n = 100;
        while (n >= 10) { n /= 2; putint(n); putchar(' '); }
    ";
    assert_eq!(run(src, ""), "50 25 12 6 ");
}

#[test]
fn test_demo_programs() {
    let hello = std::fs::read_to_string(concat!(env!("CARGO_MANIFEST_DIR"), "/demos/hello.tc"))
        .expect("read demo");
    assert_eq!(run(&hello, ""), "Hello, world!\n");

    let factor = std::fs::read_to_string(concat!(env!("CARGO_MANIFEST_DIR"), "/demos/factor.tc"))
        .expect("read demo");
    assert_eq!(run(&factor, "192\n"), "192 = 2 * 2 * 2 * 2 * 2 * 2 * 3\n");
    assert_eq!(run(&factor, "97\n"), "97 = 97\n");
}

// ── the command-line driver ──

fn tapec_bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_tapec"))
}

fn write_program(source: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("create temp file");
    file.write_all(source.as_bytes()).expect("write temp file");
    file
}

#[test]
fn test_cli_build_emits_primitives() {
    let file = write_program("putchar(65); putchar(10);");
    let out = tapec_bin()
        .arg("build")
        .arg(file.path())
        .output()
        .expect("run tapec");
    assert!(out.status.success());
    let text = String::from_utf8_lossy(&out.stdout);
    assert!(text.chars().all(|c| "><+-.,[]\n".contains(c)));
    assert!(text.lines().all(|line| line.len() <= 80));

    // the emitted program must actually print "A\n"
    let mut input = "".as_bytes();
    let mut printed = Vec::new();
    execute(&text, &mut input, &mut printed, Some(1_000_000)).unwrap();
    assert_eq!(printed, b"A\n");
}

#[test]
fn test_cli_build_annotated() {
    let file = write_program("a = 1; putint(a * 3);");
    let out = tapec_bin()
        .arg("build")
        .arg("--annotate")
        .arg(file.path())
        .output()
        .expect("run tapec");
    assert!(out.status.success());
    let text = String::from_utf8_lossy(&out.stdout);
    assert!(text.contains("mul: "));
    let mut input = "".as_bytes();
    let mut printed = Vec::new();
    execute(&text, &mut input, &mut printed, Some(10_000_000)).unwrap();
    assert_eq!(printed, b"3");
}

#[test]
fn test_cli_run_executes_program() {
    let file = write_program("a = getint(); putint(a + 1);");
    let mut child = tapec_bin()
        .arg("run")
        .arg(file.path())
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .expect("spawn tapec");
    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"41\n")
        .expect("write stdin");
    let out = child.wait_with_output().expect("wait for tapec");
    assert!(out.status.success());
    assert_eq!(out.stdout, b"42");
}

#[test]
fn test_cli_reports_errors_with_nonzero_exit() {
    let file = write_program("a = b;");
    let out = tapec_bin()
        .arg("build")
        .arg(file.path())
        .output()
        .expect("run tapec");
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("undefined"), "stderr: {}", stderr);
    assert!(out.stdout.is_empty());
}

#[test]
fn test_cli_check_is_silent_on_stdout() {
    let file = write_program("putchar(65);");
    let out = tapec_bin()
        .arg("check")
        .arg(file.path())
        .output()
        .expect("run tapec");
    assert!(out.status.success());
    assert!(out.stdout.is_empty());
    assert!(String::from_utf8_lossy(&out.stderr).contains("ok"));
}

#[test]
fn test_cli_missing_file() {
    let out = tapec_bin()
        .arg("build")
        .arg("/no/such/file.tc")
        .output()
        .expect("run tapec");
    assert!(!out.status.success());
}
