//! A [`TableStore`] backed by a FITS file.
//!
//! Reading pulls every HDU into memory: the primary HDU becomes a header-only
//! section named `PRIMARY`, and every binary table becomes a section named by
//! its `EXTNAME`. Writing replaces the whole file.

use std::{
    ffi::{CStr, CString},
    os::raw::{c_char, c_int, c_long},
    path::{Path, PathBuf},
};

use fitsio::{errors::check_status as fits_check_status, FitsFile};
use log::{debug, trace, warn};

use super::*;
use crate::constants::PRIMARY;

// Data type codes (fitsio.h).
const TBYTE: c_int = 11;
const TSBYTE: c_int = 12;
const TLOGICAL: c_int = 14;
const TSTRING: c_int = 16;
const TSHORT: c_int = 21;
const TINT: c_int = 31;
const TLONG: c_int = 41;
const TFLOAT: c_int = 42;
const TLONGLONG: c_int = 81;
const TDOUBLE: c_int = 82;

/// cfitsio's key, value and comment buffers are all shorter than a card.
const CARD_LEN: usize = 81;

/// Keys that cfitsio writes itself when a table is created. They are kept when
/// reading but never written back from a [`Header`].
fn is_structural(key: &str) -> bool {
    const FIXED: [&str; 9] = [
        "SIMPLE", "XTENSION", "BITPIX", "NAXIS", "EXTEND", "PCOUNT", "GCOUNT", "TFIELDS",
        "EXTNAME",
    ];
    const INDEXED: [&str; 8] = [
        "NAXIS", "TTYPE", "TFORM", "TUNIT", "TDIM", "TNULL", "TSCAL", "TZERO",
    ];
    FIXED.contains(&key)
        || INDEXED.iter().any(|prefix| {
            key.strip_prefix(prefix)
                .map(|n| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()))
                .unwrap_or(false)
        })
}

#[derive(Debug)]
pub struct FitsStore {
    path: PathBuf,
    sections: Vec<Section>,
}

impl FitsStore {
    /// Read every HDU of an existing FITS file.
    #[track_caller]
    pub fn open<P: AsRef<Path>>(path: P) -> Result<FitsStore, StoreError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(StoreError::Missing {
                fits_filename: path.to_path_buf().into_boxed_path(),
            });
        }
        let mut fptr = fits_open(path)?;
        let num_hdus = fits_num_hdus(&mut fptr)?;

        let mut sections = Vec::with_capacity(num_hdus);
        for hdu_num in 0..num_hdus {
            fits_move_to_hdu(&mut fptr, hdu_num)?;
            let header = fits_read_header(&mut fptr, hdu_num)?;
            let name = if hdu_num == 0 {
                PRIMARY.to_string()
            } else {
                header
                    .get("EXTNAME")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string()
            };
            let columns = fits_read_columns(&mut fptr, hdu_num, &header)?;
            debug!(
                "{}: HDU {hdu_num} ({name}) has {} columns",
                path.display(),
                columns.len()
            );
            sections.push(Section {
                name,
                header,
                columns,
            });
        }

        Ok(FitsStore {
            path: path.to_path_buf(),
            sections,
        })
    }

    /// A store that will create the file at `path` when written to. Nothing
    /// is touched until then.
    pub fn create<P: AsRef<Path>>(path: P) -> FitsStore {
        FitsStore {
            path: path.as_ref().to_path_buf(),
            sections: vec![],
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TableStore for FitsStore {
    fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// The first section is written into the primary HDU if it's named
    /// `PRIMARY` (its columns are ignored). Every other section becomes a
    /// binary table.
    fn write(&mut self, sections: Vec<Section>) -> Result<(), StoreError> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
        }
        let mut fptr = FitsFile::create(&self.path).open().map_err(|e| {
            let caller = std::panic::Location::caller();
            StoreError::Open {
                fits_error: Box::new(e),
                fits_filename: self.path.clone().into_boxed_path(),
                source_file: caller.file(),
                source_line: caller.line(),
                source_column: caller.column(),
            }
        })?;

        let mut hdu_num = 0;
        for section in &sections {
            if section.name == PRIMARY && hdu_num == 0 {
                fits_write_header(&mut fptr, 0, &section.header)?;
                continue;
            }
            hdu_num += 1;
            fits_create_table(&mut fptr, hdu_num, section)?;
            fits_write_header(&mut fptr, hdu_num, &section.header)?;
            for (i, column) in section.columns.iter().enumerate() {
                fits_write_column(&mut fptr, hdu_num, i as c_int + 1, column)?;
            }
            trace!(
                "Wrote {} ({} rows) to HDU {hdu_num}",
                section.name,
                section.num_rows()
            );
        }
        debug!("Wrote {} HDUs to {}", hdu_num + 1, self.path.display());

        self.sections = sections;
        Ok(())
    }
}

/// Open a fits file.
#[track_caller]
fn fits_open(file: &Path) -> Result<FitsFile, StoreError> {
    FitsFile::open(file).map_err(|e| {
        let caller = std::panic::Location::caller();
        StoreError::Open {
            fits_error: Box::new(e),
            fits_filename: file.to_path_buf().into_boxed_path(),
            source_file: caller.file(),
            source_line: caller.line(),
            source_column: caller.column(),
        }
    })
}

#[track_caller]
fn fitsio_error(fptr: &FitsFile, hdu_num: usize, e: fitsio::errors::Error) -> StoreError {
    let caller = std::panic::Location::caller();
    StoreError::Fitsio {
        fits_error: Box::new(e),
        fits_filename: fptr.filename.clone().into_boxed_path(),
        hdu_num: hdu_num + 1,
        source_file: caller.file(),
        source_line: caller.line(),
        source_column: caller.column(),
    }
}

#[track_caller]
fn check_status(fptr: &FitsFile, hdu_num: usize, status: c_int) -> Result<(), StoreError> {
    fits_check_status(status).map_err(|e| fitsio_error(fptr, hdu_num, e))
}

fn fits_num_hdus(fptr: &mut FitsFile) -> Result<usize, StoreError> {
    let mut status = 0;
    let mut num_hdus = 0;
    unsafe {
        // ffthdu = fits_get_num_hdus
        fitsio_sys::ffthdu(
            fptr.as_raw(), /* I - FITS file pointer */
            &mut num_hdus, /* O - number of HDUs    */
            &mut status,   /* IO - error status     */
        );
    }
    check_status(fptr, 0, status)?;
    Ok(num_hdus as usize)
}

/// Parse the value part of a header card.
fn parse_card_value(value: &str) -> Option<HeaderValue> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Some(quoted) = value.strip_prefix('\'') {
        let inner = quoted.strip_suffix('\'').unwrap_or(quoted);
        return Some(HeaderValue::Str(inner.replace("''", "'").trim_end().to_string()));
    }
    match value {
        "T" => return Some(HeaderValue::Bool(true)),
        "F" => return Some(HeaderValue::Bool(false)),
        _ => (),
    }
    if let Ok(i) = value.parse() {
        return Some(HeaderValue::Int(i));
    }
    value.replace(['D', 'd'], "E").parse().ok().map(HeaderValue::Float)
}

/// Read every card of the current HDU's header. COMMENT cards are kept;
/// HISTORY and blank cards are not.
fn fits_read_header(fptr: &mut FitsFile, hdu_num: usize) -> Result<Header, StoreError> {
    let mut status = 0;
    let mut num_keys = 0;
    unsafe {
        // ffghsp = fits_get_hdrspace
        fitsio_sys::ffghsp(
            fptr.as_raw(),        /* I - FITS file pointer                     */
            &mut num_keys,        /* O - number of existing keywords in header */
            std::ptr::null_mut(), /* O - how many more keywords will fit       */
            &mut status,          /* IO - error status                         */
        );
    }
    check_status(fptr, hdu_num, status)?;

    let mut header = Header::default();
    let mut key_buf = [0 as c_char; CARD_LEN];
    let mut value_buf = [0 as c_char; CARD_LEN];
    let mut comment_buf = [0 as c_char; CARD_LEN];
    for key_num in 1..=num_keys {
        unsafe {
            // ffgkyn = fits_read_keyn
            fitsio_sys::ffgkyn(
                fptr.as_raw(),            /* I - FITS file pointer             */
                key_num,                  /* I - number of the keyword to read */
                key_buf.as_mut_ptr(),     /* O - name of the keyword           */
                value_buf.as_mut_ptr(),   /* O - keyword value                 */
                comment_buf.as_mut_ptr(), /* O - keyword comment               */
                &mut status,              /* IO - error status                 */
            );
        }
        check_status(fptr, hdu_num, status)?;
        let (key, value, comment) = unsafe {
            (
                CStr::from_ptr(key_buf.as_ptr()).to_string_lossy(),
                CStr::from_ptr(value_buf.as_ptr()).to_string_lossy(),
                CStr::from_ptr(comment_buf.as_ptr()).to_string_lossy(),
            )
        };

        match key.as_ref() {
            "COMMENT" => header.add_comment(comment.trim_end()),
            "HISTORY" | "" | "CONTINUE" => (),
            key => match parse_card_value(&value) {
                Some(v) => {
                    let comment = comment.trim();
                    header.set(key, v, (!comment.is_empty()).then_some(comment));
                }
                None => trace!("HDU {}: skipping valueless key {key}", hdu_num + 1),
            },
        }
    }
    Ok(header)
}

/// Read every column of the current HDU, if it's a table. Columns of types
/// that can't be represented are skipped.
fn fits_read_columns(
    fptr: &mut FitsFile,
    hdu_num: usize,
    header: &Header,
) -> Result<Vec<Column>, StoreError> {
    let num_columns = header.get("TFIELDS").and_then(|v| v.as_i64()).unwrap_or(0);
    let num_rows = header.get("NAXIS2").and_then(|v| v.as_i64()).unwrap_or(0) as usize;
    if header.get("XTENSION").and_then(|v| v.as_str()) != Some("BINTABLE") {
        return Ok(vec![]);
    }

    let mut columns = Vec::with_capacity(num_columns as usize);
    for col_num in 1..=num_columns as c_int {
        let name = match header
            .get(&format!("TTYPE{col_num}"))
            .and_then(|v| v.as_str())
        {
            Some(n) => n.to_string(),
            None => continue,
        };
        let unit = header
            .get(&format!("TUNIT{col_num}"))
            .and_then(|v| v.as_str())
            .filter(|u| !u.is_empty())
            .map(|u| u.to_string());

        let mut status = 0;
        let mut type_code = 0;
        let mut repeat: c_long = 0;
        let mut width: c_long = 0;
        unsafe {
            // ffgtcl = fits_get_coltype
            fitsio_sys::ffgtcl(
                fptr.as_raw(),  /* I - FITS file pointer                       */
                col_num,        /* I - column number                           */
                &mut type_code, /* O - column datatype code                    */
                &mut repeat,    /* O - repeat count of field                   */
                &mut width,     /* O - width of one element                    */
                &mut status,    /* IO - error status                           */
            );
        }
        check_status(fptr, hdu_num, status)?;
        let repeat = repeat as usize;
        let num_elements = num_rows * repeat;

        let data = match type_code {
            TLOGICAL => {
                let raw: Vec<c_char> = read_column(fptr, hdu_num, col_num, TLOGICAL, num_elements)?;
                ColumnData::Logical(raw.into_iter().map(|b| b != 0).collect())
            }
            TBYTE | TSBYTE | TSHORT => {
                ColumnData::Short(read_column(fptr, hdu_num, col_num, TSHORT, num_elements)?)
            }
            TINT | TLONG => {
                ColumnData::Int(read_column(fptr, hdu_num, col_num, TINT, num_elements)?)
            }
            TFLOAT => ColumnData::Float(read_column(fptr, hdu_num, col_num, TFLOAT, num_elements)?),
            TDOUBLE | TLONGLONG => {
                ColumnData::Double(read_column(fptr, hdu_num, col_num, TDOUBLE, num_elements)?)
            }
            TSTRING => ColumnData::Text {
                width: repeat,
                values: read_string_column(fptr, hdu_num, col_num, repeat, num_rows)?,
            },
            _ => {
                warn!(
                    "HDU {}: skipping column {name} with unsupported type code {type_code}",
                    hdu_num + 1
                );
                continue;
            }
        };
        columns.push(Column {
            name,
            unit,
            repeat,
            data,
        });
    }
    Ok(columns)
}

/// Read `num_elements` values from a column of the current HDU, starting at
/// the first row, converting to `data_type` (which must match `T`).
fn read_column<T: Default + Clone>(
    fptr: &mut FitsFile,
    hdu_num: usize,
    col_num: c_int,
    data_type: c_int,
    num_elements: usize,
) -> Result<Vec<T>, StoreError> {
    let mut array = vec![T::default(); num_elements];
    if num_elements == 0 {
        return Ok(array);
    }
    let mut status = 0;
    unsafe {
        // ffgcv = fits_read_col
        fitsio_sys::ffgcv(
            fptr.as_raw(),             /* I - FITS file pointer                       */
            data_type,                 /* I - datatype of the values                  */
            col_num,                   /* I - number of column to read (1 = 1st col)  */
            1,                         /* I - first row to read (1 = 1st row)         */
            1,                         /* I - first vector element to read (1 = 1st)  */
            num_elements as i64,       /* I - number of values to read                */
            std::ptr::null_mut(),      /* I - value for null pixels                   */
            array.as_mut_ptr().cast(), /* O - array of values that are read           */
            &mut 0,                    /* O - set to 1 if any values are null; else 0 */
            &mut status,               /* IO - error status                           */
        );
    }
    check_status(fptr, hdu_num, status)?;
    Ok(array)
}

/// Read one string of at most `width` bytes per row from a column of the
/// current HDU. Trailing blanks are removed.
fn read_string_column(
    fptr: &mut FitsFile,
    hdu_num: usize,
    col_num: c_int,
    width: usize,
    num_rows: usize,
) -> Result<Vec<String>, StoreError> {
    if num_rows == 0 {
        return Ok(vec![]);
    }
    let mut buffers = vec![vec![0 as c_char; width + 1]; num_rows];
    let mut pointers: Vec<*mut c_char> = buffers.iter_mut().map(|b| b.as_mut_ptr()).collect();
    let mut nulval = [0 as c_char; 1];
    let mut status = 0;
    unsafe {
        // ffgcvs = fits_read_col_str
        fitsio_sys::ffgcvs(
            fptr.as_raw(),         /* I - FITS file pointer                       */
            col_num,               /* I - number of column to read (1 = 1st col)  */
            1,                     /* I - first row to read (1 = 1st row)         */
            1,                     /* I - first character to read (1 = 1st)       */
            num_rows as i64,       /* I - number of strings to read               */
            nulval.as_mut_ptr(),   /* I - string for null pixels                  */
            pointers.as_mut_ptr(), /* O - array of values that are read           */
            &mut 0,                /* O - set to 1 if any values are null; else 0 */
            &mut status,           /* IO - error status                           */
        );
    }
    check_status(fptr, hdu_num, status)?;

    Ok(buffers
        .iter()
        .map(|b| {
            let s = unsafe { CStr::from_ptr(b.as_ptr()) };
            s.to_string_lossy().trim_end().to_string()
        })
        .collect())
}

/// Helper function to convert strings into pointers of C strings.
fn rust_strings_to_c_strings<T: AsRef<str>>(
    strings: &[T],
) -> Result<Vec<*mut c_char>, std::ffi::NulError> {
    let mut c_strings = Vec::with_capacity(strings.len());
    for s in strings {
        match CString::new(s.as_ref()) {
            Ok(c_str) => c_strings.push(c_str.into_raw()),
            Err(e) => {
                deallocate_rust_c_strings(c_strings);
                return Err(e);
            }
        }
    }
    Ok(c_strings)
}

fn deallocate_rust_c_strings(c_string_ptrs: Vec<*mut c_char>) {
    unsafe {
        for ptr in c_string_ptrs {
            drop(CString::from_raw(ptr));
        }
    }
}

fn fits_move_to_hdu(fptr: &mut FitsFile, hdu_num: usize) -> Result<(), StoreError> {
    let mut status = 0;
    unsafe {
        // ffmahd = fits_movabs_hdu
        fitsio_sys::ffmahd(
            fptr.as_raw(),        /* I - FITS file pointer             */
            hdu_num as c_int + 1, /* I - number of the HDU to move to  */
            std::ptr::null_mut(), /* O - type of extension, 0, 1, or 2 */
            &mut status,          /* IO - error status                 */
        );
    }
    check_status(fptr, hdu_num, status)
}

/// Append a binary table for `section` and move to it.
fn fits_create_table(
    fptr: &mut FitsFile,
    hdu_num: usize,
    section: &Section,
) -> Result<(), StoreError> {
    let num_rows = section.num_rows();
    for column in &section.columns {
        let expected = match &column.data {
            ColumnData::Text { .. } => num_rows,
            _ => num_rows * column.repeat,
        };
        if column.data.len() != expected {
            return Err(StoreError::Ragged {
                column: column.name.clone(),
                len: column.data.len(),
                repeat: column.repeat,
            });
        }
    }

    let names: Vec<&str> = section.columns.iter().map(|c| c.name.as_str()).collect();
    let formats: Vec<String> = section.columns.iter().map(|c| c.tform()).collect();
    let units: Vec<&str> = section
        .columns
        .iter()
        .map(|c| c.unit.as_deref().unwrap_or(""))
        .collect();
    let extname = CString::new(section.name.as_str())?;
    let mut c_col_names = rust_strings_to_c_strings(&names)?;
    let mut c_col_formats = rust_strings_to_c_strings(&formats)?;
    let mut c_col_units = rust_strings_to_c_strings(&units)?;

    let num_columns = section.columns.len() as c_int;
    let mut status = 0;
    unsafe {
        // ffcrtb = fits_create_tbl. BINARY_TBL is 2.
        fitsio_sys::ffcrtb(
            fptr.as_raw(),              /* I - FITS file pointer                        */
            2,                          /* I - type of table to create                  */
            num_rows as i64,            /* I - number of rows in the table              */
            num_columns,                /* I - number of columns in the table           */
            c_col_names.as_mut_ptr(),   /* I - name of each column                      */
            c_col_formats.as_mut_ptr(), /* I - value of TFORMn keyword for each column  */
            c_col_units.as_mut_ptr(),   /* I - value of TUNITn keyword for each column  */
            extname.as_ptr(),           /* I - value of EXTNAME keyword, if any         */
            &mut status,                /* IO - error status                            */
        );
    }
    deallocate_rust_c_strings(c_col_names);
    deallocate_rust_c_strings(c_col_formats);
    deallocate_rust_c_strings(c_col_units);
    check_status(fptr, hdu_num, status)?;

    fits_move_to_hdu(fptr, hdu_num)
}

/// Write the non-structural cards of `header` into an HDU.
fn fits_write_header(fptr: &mut FitsFile, hdu_num: usize, header: &Header) -> Result<(), StoreError> {
    fits_move_to_hdu(fptr, hdu_num)?;

    for card in header.cards() {
        if is_structural(&card.key) {
            continue;
        }
        let mut status = 0;
        let keyname = CString::new(card.key.as_str())?;
        let comment = match &card.comment {
            Some(c) => Some(CString::new(c.as_str())?),
            None => None,
        };
        let comment_ptr = comment.as_ref().map(|c| c.as_ptr()).unwrap_or(std::ptr::null());
        unsafe {
            match &card.value {
                HeaderValue::Bool(b) => {
                    // ffukyl = fits_update_key_log
                    fitsio_sys::ffukyl(
                        fptr.as_raw(),    /* I - FITS file pointer  */
                        keyname.as_ptr(), /* I - keyword name       */
                        *b as c_int,      /* I - keyword value      */
                        comment_ptr,      /* I - keyword comment    */
                        &mut status,      /* IO - error status      */
                    );
                }
                HeaderValue::Int(i) => {
                    // ffukyj = fits_update_key_lng
                    fitsio_sys::ffukyj(
                        fptr.as_raw(),    /* I - FITS file pointer  */
                        keyname.as_ptr(), /* I - keyword name       */
                        *i,               /* I - keyword value      */
                        comment_ptr,      /* I - keyword comment    */
                        &mut status,      /* IO - error status      */
                    );
                }
                HeaderValue::Float(f) => {
                    // ffukyd = fits_update_key_dbl
                    fitsio_sys::ffukyd(
                        fptr.as_raw(),    /* I - FITS file pointer  */
                        keyname.as_ptr(), /* I - keyword name       */
                        *f,               /* I - keyword value      */
                        -15,              /* I - no of decimals     */
                        comment_ptr,      /* I - keyword comment    */
                        &mut status,      /* IO - error status      */
                    );
                }
                HeaderValue::Str(s) => {
                    let value = CString::new(s.as_str())?;
                    // ffukys = fits_update_key_str
                    fitsio_sys::ffukys(
                        fptr.as_raw(),    /* I - FITS file pointer  */
                        keyname.as_ptr(), /* I - keyword name       */
                        value.as_ptr(),   /* I - keyword value      */
                        comment_ptr,      /* I - keyword comment    */
                        &mut status,      /* IO - error status      */
                    );
                }
            }
        }
        check_status(fptr, hdu_num, status)?;
    }

    for comment in header.comments() {
        let mut status = 0;
        let comment = CString::new(comment.as_str())?;
        unsafe {
            // ffpcom = fits_write_comment
            fitsio_sys::ffpcom(
                fptr.as_raw(),    /* I - FITS file pointer   */
                comment.as_ptr(), /* I - comment string      */
                &mut status,      /* IO - error status       */
            );
        }
        check_status(fptr, hdu_num, status)?;
    }
    Ok(())
}

/// Write all of a column's values into the current HDU, starting at the first
/// row. cfitsio wraps onto subsequent rows every `repeat` elements.
fn fits_write_column(
    fptr: &mut FitsFile,
    hdu_num: usize,
    col_num: c_int,
    column: &Column,
) -> Result<(), StoreError> {
    let num_elements = column.data.len() as i64;
    if num_elements == 0 {
        return Ok(());
    }
    let mut status = 0;
    match &column.data {
        ColumnData::Logical(v) => {
            let mut raw: Vec<c_char> = v.iter().map(|&b| b as c_char).collect();
            unsafe {
                // ffpcll = fits_write_col_log
                fitsio_sys::ffpcll(
                    fptr.as_raw(),    /* I - FITS file pointer                       */
                    col_num,          /* I - number of column to write (1 = 1st col) */
                    1,                /* I - first row to write (1 = 1st row)        */
                    1,                /* I - first vector element to write (1 = 1st) */
                    num_elements,     /* I - number of values to write               */
                    raw.as_mut_ptr(), /* I - array of values to write                */
                    &mut status,      /* IO - error status                           */
                );
            }
        }
        ColumnData::Short(v) => {
            let mut v = v.clone();
            unsafe {
                // ffpcli = fits_write_col_sht
                fitsio_sys::ffpcli(
                    fptr.as_raw(),
                    col_num,
                    1,
                    1,
                    num_elements,
                    v.as_mut_ptr(),
                    &mut status,
                );
            }
        }
        ColumnData::Int(v) => {
            let mut v = v.clone();
            unsafe {
                // ffpclk = fits_write_col_int
                fitsio_sys::ffpclk(
                    fptr.as_raw(),
                    col_num,
                    1,
                    1,
                    num_elements,
                    v.as_mut_ptr(),
                    &mut status,
                );
            }
        }
        ColumnData::Float(v) => {
            let mut v = v.clone();
            unsafe {
                // ffpcle = fits_write_col_flt
                fitsio_sys::ffpcle(
                    fptr.as_raw(),
                    col_num,
                    1,
                    1,
                    num_elements,
                    v.as_mut_ptr(),
                    &mut status,
                );
            }
        }
        ColumnData::Double(v) => {
            let mut v = v.clone();
            unsafe {
                // ffpcld = fits_write_col_dbl
                fitsio_sys::ffpcld(
                    fptr.as_raw(),
                    col_num,
                    1,
                    1,
                    num_elements,
                    v.as_mut_ptr(),
                    &mut status,
                );
            }
        }
        ColumnData::Text { values, .. } => {
            let mut c_strings = rust_strings_to_c_strings(values)?;
            unsafe {
                // ffpcls = fits_write_col_str
                fitsio_sys::ffpcls(
                    fptr.as_raw(),          /* I - FITS file pointer                       */
                    col_num,                /* I - number of column to write (1 = 1st col) */
                    1,                      /* I - first row to write (1 = 1st row)        */
                    1,                      /* I - first vector element to write (1 = 1st) */
                    num_elements,           /* I - number of strings to write              */
                    c_strings.as_mut_ptr(), /* I - array of pointers to strings            */
                    &mut status,            /* IO - error status                           */
                );
            }
            deallocate_rust_c_strings(c_strings);
        }
    }
    check_status(fptr, hdu_num, status)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn card_values_are_parsed() {
        assert_eq!(
            parse_card_value("'OI_VIS  '"),
            Some(HeaderValue::Str("OI_VIS".to_string()))
        );
        assert_eq!(
            parse_card_value("'it''s'"),
            Some(HeaderValue::Str("it's".to_string()))
        );
        assert_eq!(parse_card_value("T"), Some(HeaderValue::Bool(true)));
        assert_eq!(parse_card_value("F"), Some(HeaderValue::Bool(false)));
        assert_eq!(parse_card_value("  1"), Some(HeaderValue::Int(1)));
        assert_eq!(parse_card_value("-5"), Some(HeaderValue::Int(-5)));
        assert_eq!(parse_card_value("1.5D3"), Some(HeaderValue::Float(1500.0)));
        assert_eq!(
            parse_card_value("-2642728.2"),
            Some(HeaderValue::Float(-2642728.2))
        );
        assert_eq!(parse_card_value(""), None);
    }

    #[test]
    fn structural_keys() {
        assert!(is_structural("NAXIS"));
        assert!(is_structural("NAXIS2"));
        assert!(is_structural("TFORM12"));
        assert!(is_structural("EXTNAME"));
        assert!(!is_structural("TARGET"));
        assert!(!is_structural("TTYPE"));
        assert!(!is_structural("INSNAME"));
        assert!(!is_structural("OI_REVN"));
    }
}
