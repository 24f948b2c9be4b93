//! Batch driver: applies a resolved kernel across row collections.
//!
//! Three shapes - paired rows ([`pairwise`]), all-pairs ([`cdist`]) and
//! one-to-many ([`broadcast`]) - over strided [`RowMatrix`] views. Work is
//! divided by output row; within a row the kernel is single-threaded.
//!
//! A thread count of `1` runs serially, `0` selects the hardware
//! concurrency, and any other positive number builds a fixed-size worker
//! pool whose lifetime is scoped to the call. Workers write to disjoint
//! output cells; the join barrier before returning publishes every write to
//! the caller.

use rayon::prelude::*;

use crate::capability::ANY;
use crate::dispatch::Kernel;
use crate::error::{Error, Result};
use crate::types::{MetricKind, SimdScalar};

// =============================================================================
// Strided row view
// =============================================================================

/// Borrowed view over a batch of equally-sized rows.
///
/// Rows need not be contiguous: `row_stride` counts elements from the start
/// of one row to the start of the next and may exceed `dims` (padded or
/// interleaved storage).
#[derive(Debug, Clone, Copy)]
pub struct RowMatrix<'a, T> {
    data: &'a [T],
    rows: usize,
    dims: usize,
    row_stride: usize,
}

impl<'a, T> RowMatrix<'a, T> {
    /// Creates a view over densely packed rows (`row_stride == dims`).
    pub fn new(data: &'a [T], rows: usize, dims: usize) -> Result<Self> {
        Self::with_stride(data, rows, dims, dims)
    }

    /// Creates a view with an explicit row stride, in elements.
    pub fn with_stride(data: &'a [T], rows: usize, dims: usize, row_stride: usize) -> Result<Self> {
        if row_stride < dims {
            return Err(Error::Layout(format!(
                "row stride {row_stride} is smaller than the row width {dims}"
            )));
        }
        let required = if rows == 0 {
            0
        } else {
            (rows - 1) * row_stride + dims
        };
        if data.len() < required {
            return Err(Error::Layout(format!(
                "buffer holds {} elements, {required} required for {rows} rows",
                data.len()
            )));
        }
        Ok(Self {
            data,
            rows,
            dims,
            row_stride,
        })
    }

    /// Number of rows.
    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Elements per row.
    #[must_use]
    pub fn dims(&self) -> usize {
        self.dims
    }

    /// Elements from one row start to the next.
    #[must_use]
    pub fn row_stride(&self) -> usize {
        self.row_stride
    }

    /// Borrows one row.
    ///
    /// # Panics
    ///
    /// Panics when `index >= rows`.
    #[must_use]
    pub fn row(&self, index: usize) -> &'a [T] {
        assert!(index < self.rows, "row index {index} out of {}", self.rows);
        let start = index * self.row_stride;
        &self.data[start..start + self.dims]
    }
}

// =============================================================================
// Worker-pool plumbing
// =============================================================================

/// Runs `op` over every output index, serially or on a scoped pool.
fn for_each_row<OP>(threads: usize, len: usize, op: OP) -> Result<()>
where
    OP: Fn(usize) + Send + Sync,
{
    if threads == 1 || len <= 1 {
        for index in 0..len {
            op(index);
        }
        return Ok(());
    }

    // num_threads(0) lets rayon pick the hardware concurrency.
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .map_err(|err| Error::ThreadPool(err.to_string()))?;
    pool.install(|| (0..len).into_par_iter().for_each(op));
    Ok(())
}

fn check_dims<T>(a: &RowMatrix<'_, T>, b: &RowMatrix<'_, T>) -> Result<()> {
    if a.dims != b.dims {
        return Err(Error::DimensionMismatch {
            expected: a.dims,
            actual: b.dims,
        });
    }
    Ok(())
}

fn check_output(expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(Error::OutputLengthMismatch { expected, actual });
    }
    Ok(())
}

/// Pointer-identity wrapper so closures can write disjoint cells of a shared
/// output buffer without aliasing `&mut` borrows across workers.
#[derive(Clone, Copy)]
struct OutPtr(*mut f64);

// SAFETY: every worker writes a distinct index; the pool's join barrier
// sequences the writes before the caller observes the buffer.
unsafe impl Send for OutPtr {}
unsafe impl Sync for OutPtr {}

impl OutPtr {
    #[inline]
    unsafe fn write(self, index: usize, value: f64) {
        // SAFETY: index is bounded by the validated output length.
        unsafe { self.0.add(index).write(value) }
    }

    #[inline]
    unsafe fn slot(self, index: usize) -> *mut f64 {
        // SAFETY: index is bounded by the validated output length.
        unsafe { self.0.add(index) }
    }
}

// =============================================================================
// Paired mode
// =============================================================================

/// Computes `out[r] = metric(a[r], b[r])` for equally shaped batches.
///
/// Shape requirements: equal `dims`, equal `rows`, `out.len() == rows`.
pub fn pairwise<T: SimdScalar>(
    metric: MetricKind,
    a: &RowMatrix<'_, T>,
    b: &RowMatrix<'_, T>,
    out: &mut [f64],
    threads: usize,
) -> Result<()> {
    check_dims(a, b)?;
    if a.rows != b.rows {
        return Err(Error::RowCountMismatch {
            left: a.rows,
            right: b.rows,
        });
    }
    check_output(a.rows, out.len())?;
    if a.rows == 0 {
        return Ok(());
    }
    if a.dims == 0 {
        out.fill(metric.empty_value());
        return Ok(());
    }

    let kernel = Kernel::resolve(metric, T::DATATYPE, ANY)?;
    let n = a.dims;
    let dst = OutPtr(out.as_mut_ptr());

    for_each_row(threads, a.rows, move |row| {
        let mut value = 0.0_f64;
        // SAFETY: rows are in-bounds views of the validated matrices and the
        // kernel matches T's dtype; each worker writes only its own cell.
        unsafe {
            kernel.invoke(
                a.row(row).as_ptr().cast(),
                b.row(row).as_ptr().cast(),
                n,
                &mut value,
            );
            dst.write(row, value);
        }
    })
}

/// Computes `out[r] = [re, im]` of a complex metric over paired rows.
///
/// Rows interleave `2n` scalars; `dims` must be even.
pub fn pairwise_complex<T: SimdScalar>(
    metric: MetricKind,
    a: &RowMatrix<'_, T>,
    b: &RowMatrix<'_, T>,
    out: &mut [[f64; 2]],
    threads: usize,
) -> Result<()> {
    let datatype = T::COMPLEX.ok_or(Error::UnsupportedCombination {
        metric,
        datatype: T::DATATYPE,
    })?;
    check_dims(a, b)?;
    if a.rows != b.rows {
        return Err(Error::RowCountMismatch {
            left: a.rows,
            right: b.rows,
        });
    }
    check_output(a.rows, out.len())?;
    if a.dims % 2 != 0 {
        return Err(Error::OddComplexLength(a.dims));
    }
    if a.rows == 0 {
        return Ok(());
    }
    if a.dims == 0 {
        out.fill([0.0, 0.0]);
        return Ok(());
    }

    let kernel = Kernel::resolve(metric, datatype, ANY)?;
    let n = a.dims / 2;
    let dst = OutPtr(out.as_mut_ptr().cast::<f64>());

    for_each_row(threads, a.rows, move |row| {
        // SAFETY: each worker writes the two lanes of its own cell.
        unsafe {
            kernel.invoke(
                a.row(row).as_ptr().cast(),
                b.row(row).as_ptr().cast(),
                n,
                dst.slot(2 * row),
            );
        }
    })
}

// =============================================================================
// All-pairs mode
// =============================================================================

/// Computes the full `a.rows x b.rows` distance matrix, row-major.
///
/// `out[i * b.rows + j] = metric(a[i], b[j])`.
pub fn cdist<T: SimdScalar>(
    metric: MetricKind,
    a: &RowMatrix<'_, T>,
    b: &RowMatrix<'_, T>,
    out: &mut [f64],
    threads: usize,
) -> Result<()> {
    check_dims(a, b)?;
    check_output(a.rows * b.rows, out.len())?;
    if a.rows == 0 || b.rows == 0 {
        return Ok(());
    }
    if a.dims == 0 {
        out.fill(metric.empty_value());
        return Ok(());
    }

    let kernel = Kernel::resolve(metric, T::DATATYPE, ANY)?;
    let n = a.dims;
    let columns = b.rows;
    let dst = OutPtr(out.as_mut_ptr());

    for_each_row(threads, a.rows, move |i| {
        let a_row = a.row(i);
        for j in 0..columns {
            let mut value = 0.0_f64;
            // SAFETY: workers split by output row; cells i*columns..+columns
            // belong to worker i alone.
            unsafe {
                kernel.invoke(
                    a_row.as_ptr().cast(),
                    b.row(j).as_ptr().cast(),
                    n,
                    &mut value,
                );
                dst.write(i * columns + j, value);
            }
        }
    })
}

/// Complex all-pairs: `out[i * b.rows + j]` holds `[re, im]`.
pub fn cdist_complex<T: SimdScalar>(
    metric: MetricKind,
    a: &RowMatrix<'_, T>,
    b: &RowMatrix<'_, T>,
    out: &mut [[f64; 2]],
    threads: usize,
) -> Result<()> {
    let datatype = T::COMPLEX.ok_or(Error::UnsupportedCombination {
        metric,
        datatype: T::DATATYPE,
    })?;
    check_dims(a, b)?;
    check_output(a.rows * b.rows, out.len())?;
    if a.dims % 2 != 0 {
        return Err(Error::OddComplexLength(a.dims));
    }
    if a.rows == 0 || b.rows == 0 {
        return Ok(());
    }
    if a.dims == 0 {
        out.fill([0.0, 0.0]);
        return Ok(());
    }

    let kernel = Kernel::resolve(metric, datatype, ANY)?;
    let n = a.dims / 2;
    let columns = b.rows;
    let dst = OutPtr(out.as_mut_ptr().cast::<f64>());

    for_each_row(threads, a.rows, move |i| {
        let a_row = a.row(i);
        for j in 0..columns {
            // SAFETY: worker i owns output cells i*columns..+columns.
            unsafe {
                kernel.invoke(
                    a_row.as_ptr().cast(),
                    b.row(j).as_ptr().cast(),
                    n,
                    dst.slot(2 * (i * columns + j)),
                );
            }
        }
    })
}

// =============================================================================
// Broadcast mode
// =============================================================================

/// Computes `out[r] = metric(query, m[r])` for one query against a batch.
pub fn broadcast<T: SimdScalar>(
    metric: MetricKind,
    query: &[T],
    m: &RowMatrix<'_, T>,
    out: &mut [f64],
    threads: usize,
) -> Result<()> {
    if query.len() != m.dims {
        return Err(Error::DimensionMismatch {
            expected: m.dims,
            actual: query.len(),
        });
    }
    check_output(m.rows, out.len())?;
    if m.rows == 0 {
        return Ok(());
    }
    if m.dims == 0 {
        out.fill(metric.empty_value());
        return Ok(());
    }

    let kernel = Kernel::resolve(metric, T::DATATYPE, ANY)?;
    let n = m.dims;
    let dst = OutPtr(out.as_mut_ptr());

    for_each_row(threads, m.rows, move |row| {
        let mut value = 0.0_f64;
        // SAFETY: each worker writes only its own cell.
        unsafe {
            kernel.invoke(
                query.as_ptr().cast(),
                m.row(row).as_ptr().cast(),
                n,
                &mut value,
            );
            dst.write(row, value);
        }
    })
}
