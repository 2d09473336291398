//! Small helpers and macros shared by the simulation binaries.

use std::path::Path;
use crate::error::DtcResult;

#[doc(hidden)]
pub use ndarray_npy as npy;

/// Shorthand for the complex number type used everywhere in the crate.
pub type C64 = num_complex::Complex64;

/// Construct a [`C64`] from a real part, an imaginary part (`i x`), or both.
#[macro_export]
macro_rules! c {
    ( i $im:expr ) => {
        $crate::utils::C64::new(0.0, $im)
    };
    ( $re:expr, $im:expr ) => {
        $crate::utils::C64::new($re, $im)
    };
    ( $re:expr ) => {
        $crate::utils::C64::new($re, 0.0)
    };
}

/// Create a directory (and all its parents) if it doesn't already exist.
///
/// Expands to a [`DtcResult<()>`][crate::error::DtcResult].
#[macro_export]
macro_rules! mkdir {
    ( $dir:expr ) => {
        $crate::utils::mkdir(&$dir)
    }
}

/// Write a set of named arrays to a single `.npz` file.
///
/// Expands to a [`DtcResult<()>`][crate::error::DtcResult] so that output
/// failures can be reported without losing the numerical results.
#[macro_export]
macro_rules! write_npz {
    (
        $filename:expr,
        arrays: { $( $key:expr => $arr:expr ),* $(,)? }
    ) => {
        (|| -> $crate::error::DtcResult<()> {
            let file = std::fs::File::create($filename)?;
            let mut npz = $crate::utils::npy::NpzWriter::new(file);
            $( npz.add_array($key, $arr)?; )*
            npz.finish()?;
            Ok(())
        })()
    }
}

/// Call `print!` and immediately flush.
#[macro_export]
macro_rules! print_flush {
    ( $fmt:literal $(, $val:expr )* $(,)? ) => {
        print!($fmt $(, $val )*);
        let _ = std::io::Write::flush(&mut std::io::stdout());
    }
}

/// Create `dir` if it isn't already a directory.
pub fn mkdir<P>(dir: P) -> DtcResult<()>
where P: AsRef<Path>
{
    let dir = dir.as_ref();
    if !dir.is_dir() {
        log::debug!("creating output directory {}", dir.display());
        std::fs::create_dir_all(dir)?;
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn complex_shorthand() {
        assert_eq!(c!(2.0), C64::new(2.0, 0.0));
        assert_eq!(c!(i 3.0), C64::new(0.0, 3.0));
        assert_eq!(c!(1.0, -1.0), C64::new(1.0, -1.0));
    }

    #[test]
    fn npz_roundtrip_to_disk() {
        let dir = std::env::temp_dir().join("dtc_sim_utils_test");
        mkdir!(dir).unwrap();
        let x: ndarray::Array1<f64> = ndarray::Array1::linspace(0.0, 1.0, 11);
        let res = write_npz!(
            dir.join("x.npz"),
            arrays: { "x" => &x, }
        );
        assert!(res.is_ok());
        assert!(dir.join("x.npz").is_file());
    }

    #[test]
    fn progress_counter_in_branch() {
        // expands to two statements, so it must work as an `if` body
        for k in 0..3 {
            if k % 2 == 0 {
                print_flush!("\r  {} / {} ", k, 3);
            }
        }
        print_flush!("\n");
    }
}
