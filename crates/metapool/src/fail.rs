//! Fatal diagnostics for broken allocator invariants.
//!
//! Nothing in this allocator is recovered at runtime: a violated invariant
//! prints a framed message to stderr and aborts the process. The
//! [`mp_assert!`] macro guards debug builds only — in release builds it
//! compiles to nothing, matching the zero-overhead contract of the hot path.
//! Unconditional failures (arena acquisition, over-commit, routing misses)
//! call [`fatal`] / [`fatal_ctx`] directly in every build.
//!
//! With the `fail-backtrace` feature enabled, the frame is followed by a
//! captured backtrace.

use std::io::Write;

/// Total width of the diagnostic frame, border included.
const FRAME_WIDTH: usize = 60;

/// Columns consumed by the border and inner spacing on each line.
const FRAME_PADDING: usize = 4;

const TEXT_MAX_WIDTH: usize = FRAME_WIDTH - FRAME_PADDING;

/// Diagnostic message texts, grouped here so call sites stay terse.
pub mod err {
    pub const ARENA_ALLOC_FAILED: &str = "arena acquisition failed\nthe OS allocator returned null";
    pub const ARENA_FETCH_OVERCOMMIT: &str =
        "arena over-commit\nfetch does not fit in the remaining region";
    pub const ALLOC_ZERO_SIZE: &str = "zero-size allocation";
    pub const ALLOC_ALIGN_UNSUPPORTED: &str =
        "unsupported alignment\nmust be a power of two within freelist alignment";
    pub const ALLOC_EXHAUSTED: &str =
        "allocator exhausted\nfallback walked past the end of the proxy table";
    pub const LOOKUP_ZERO_SIZE: &str = "size-class lookup with zero size";
    pub const LOOKUP_NO_MATCH: &str =
        "no matching size class\nthe metaset does not cover this request";
    pub const FREE_PROXY_OOB: &str = "free: decoded proxy index out of range";
    pub const CONSTRUCT_ZERO_SIZE: &str = "construct of a zero-sized type";
    pub const INIT_BASE_MISALIGNED: &str = "freelist region misaligned for the link slot";
    pub const INIT_STRIDE_PROXY: &str =
        "freelist stride below link span\nonly legal for global proxy zero";
    pub const RELEASE_OUT_OF_REGION: &str = "release of a pointer outside the freelist region";
    pub const RELEASE_OFF_STRIDE: &str = "release of a pointer off the freelist stride";
    pub const VAULT_INDEX_OOB: &str = "vault index out of bounds";
    pub const VAULT_BACK_EMPTY: &str = "vault back on empty";
    pub const VAULT_POP_EMPTY: &str = "vault pop on empty";
    pub const VAULT_CAPACITY_OVERFLOW: &str =
        "vault capacity overflow\nbyte size exceeds the allocator request width";
    pub const SLAG_INDEX_OOB: &str = "slag index out of bounds";
    pub const SLAG_BACK_EMPTY: &str = "slag back on empty";
    pub const SLAG_POP_EMPTY: &str = "slag pop on empty";
    pub const SLAG_CAPACITY_OVERFLOW: &str =
        "slag capacity overflow\nbyte size exceeds the allocator request width";
}

/// Prints the framed block and aborts. See [`fatal_ctx`] for the variant
/// carrying request context.
pub fn fatal(message: &str) -> ! {
    fatal_ctx(message, "")
}

/// Prints the framed block with a trailing context line and aborts.
///
/// `message` may contain newlines; each line is centered inside the frame.
/// `context` usually carries the offending values, e.g.
/// `"size = 96, align = 8"`.
pub fn fatal_ctx(message: &str, context: &str) -> ! {
    let stderr = std::io::stderr();
    let mut out = stderr.lock();

    let _ = writeln!(out, "{}", "*".repeat(FRAME_WIDTH));
    for line in message.lines() {
        write_centered(&mut out, line);
    }
    if !context.is_empty() {
        write_centered(&mut out, context);
    }
    let _ = writeln!(out, "{}", "*".repeat(FRAME_WIDTH));

    #[cfg(feature = "fail-backtrace")]
    {
        let _ = writeln!(out, "{:?}", backtrace::Backtrace::new());
    }

    let _ = out.flush();
    std::process::abort()
}

fn write_centered(out: &mut impl Write, text: &str) {
    let text = if text.len() > TEXT_MAX_WIDTH {
        &text[..TEXT_MAX_WIDTH]
    } else {
        text
    };

    let pad_total = FRAME_WIDTH - 2 - text.len();
    let pad_left = pad_total / 2;
    let pad_right = pad_total - pad_left;
    let _ = writeln!(out, "*{:pad_left$}{text}{:pad_right$}*", "", "");
}

/// Debug-build invariant check with a framed abort on failure.
///
/// Compiles to nothing in release builds; the condition is not evaluated.
/// An optional third argument set adds a formatted context line.
#[macro_export]
macro_rules! mp_assert {
    ($cond:expr, $msg:expr $(,)?) => {
        if cfg!(debug_assertions) && !$cond {
            $crate::fail::fatal($msg);
        }
    };
    ($cond:expr, $msg:expr, $($ctx:tt)+) => {
        if cfg!(debug_assertions) && !$cond {
            $crate::fail::fatal_ctx($msg, &format!($($ctx)+));
        }
    };
}
