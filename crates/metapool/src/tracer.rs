//! Optional allocation tracing.
//!
//! With the `trace` feature enabled, every routed allocation bumps a
//! per-`(raw_size, alignment, proxy_index)` counter and every empty-class
//! fallback bumps that key's fallback counter; [`export_trace`] writes the
//! accumulated table as CSV. Without the feature, the hooks compile to
//! empty inline functions — the hot paths never branch on a runtime flag.

#[cfg(feature = "trace")]
pub use enabled::{export_trace, trace, trace_fallback};

#[cfg(not(feature = "trace"))]
pub use disabled::{export_trace, trace, trace_fallback};

#[cfg(feature = "trace")]
mod enabled {
    use std::io::{self, Write};
    use std::path::Path;
    use std::sync::{Mutex, OnceLock};

    use fxhash::FxHashMap;

    #[derive(Default, Clone, Copy)]
    struct Stat {
        count: u64,
        fallbacks: u64,
        raw_total_bytes: u64,
        stride_total_bytes: u64,
    }

    type Key = (u32, u32, u16);

    fn table() -> &'static Mutex<FxHashMap<Key, Stat>> {
        static TABLE: OnceLock<Mutex<FxHashMap<Key, Stat>>> = OnceLock::new();
        TABLE.get_or_init(|| Mutex::new(FxHashMap::default()))
    }

    /// Records one routed allocation.
    pub fn trace(raw_size: u32, alignment: u32, stride: u32, proxy_index: u16) {
        let mut table = table().lock().unwrap();
        let stat = table.entry((raw_size, alignment, proxy_index)).or_default();
        stat.count += 1;
        stat.raw_total_bytes += u64::from(raw_size);
        stat.stride_total_bytes += u64::from(stride);
    }

    /// Records one empty-class fallback at the proxy that came up empty.
    pub fn trace_fallback(raw_size: u32, alignment: u32, proxy_index: u16) {
        let mut table = table().lock().unwrap();
        let stat = table.entry((raw_size, alignment, proxy_index)).or_default();
        stat.fallbacks += 1;
    }

    /// Writes the accumulated counters as CSV, creating parent directories
    /// as needed. Rows are sorted by key for deterministic output. With
    /// `clear`, the table is emptied after a successful write.
    pub fn export_trace(path: impl AsRef<Path>, clear: bool) -> io::Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let mut table = table().lock().unwrap();
        let mut rows: Vec<(Key, Stat)> = table.iter().map(|(k, v)| (*k, *v)).collect();
        rows.sort_unstable_by_key(|(key, _)| *key);

        let mut out = io::BufWriter::new(std::fs::File::create(path)?);
        writeln!(
            out,
            "raw_size,alignment,proxy_index,count,fallbacks,raw_total_bytes,stride_total_bytes"
        )?;
        for ((raw_size, alignment, proxy_index), stat) in rows {
            writeln!(
                out,
                "{raw_size},{alignment},{proxy_index},{},{},{},{}",
                stat.count, stat.fallbacks, stat.raw_total_bytes, stat.stride_total_bytes
            )?;
        }
        out.flush()?;

        if clear {
            table.clear();
        }

        metapool_log::info!("trace written: {}", path.display());
        Ok(())
    }
}

#[cfg(not(feature = "trace"))]
mod disabled {
    use std::io;
    use std::path::Path;

    #[inline(always)]
    pub fn trace(_raw_size: u32, _alignment: u32, _stride: u32, _proxy_index: u16) {}

    #[inline(always)]
    pub fn trace_fallback(_raw_size: u32, _alignment: u32, _proxy_index: u16) {}

    #[inline(always)]
    pub fn export_trace(_path: impl AsRef<Path>, _clear: bool) -> io::Result<()> {
        Ok(())
    }
}
