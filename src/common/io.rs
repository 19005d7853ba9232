use std::fs::{self, File};
use std::io::{self, Read, StdinLock};
use std::path::Path;

#[cfg(target_os = "linux")]
use std::sync::atomic::{AtomicBool, Ordering};

/// An input source: locked standard input or an opened file.
pub enum Input {
    Stdin(StdinLock<'static>),
    File(File),
}

impl Read for Input {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Input::Stdin(s) => s.read(buf),
            Input::File(f) => f.read(buf),
        }
    }
}

/// Whether O_NOATIME opens still work. Cleared after the first EPERM so later
/// FILE operands are opened with a single open() call.
#[cfg(target_os = "linux")]
static NOATIME_SUPPORTED: AtomicBool = AtomicBool::new(true);

/// Open a FILE operand for encoding with O_NOATIME on Linux, so reading a file
/// only to base64 it does not dirty its inode with an atime update.
/// O_NOATIME requires owning the file (or CAP_FOWNER); encoding someone
/// else's file fails with EPERM, in which case we fall back to a plain open.
#[cfg(target_os = "linux")]
pub fn open_noatime(path: &Path) -> io::Result<File> {
    use std::os::unix::fs::OpenOptionsExt;
    if NOATIME_SUPPORTED.load(Ordering::Relaxed) {
        match fs::OpenOptions::new()
            .read(true)
            .custom_flags(libc::O_NOATIME)
            .open(path)
        {
            Ok(f) => return Ok(f),
            Err(ref e) if e.raw_os_error() == Some(libc::EPERM) => {
                // Not our file: stop trying O_NOATIME for this process.
                NOATIME_SUPPORTED.store(false, Ordering::Relaxed);
            }
            Err(e) => return Err(e), // ENOENT, EACCES, ...: report it
        }
    }
    File::open(path)
}

#[cfg(not(target_os = "linux"))]
pub fn open_noatime(path: &Path) -> io::Result<File> {
    fs::OpenOptions::new().read(true).open(path)
}

/// Open `name` for reading; `-` means standard input.
pub fn open_input(name: &str) -> io::Result<Input> {
    if name == "-" {
        return Ok(Input::Stdin(io::stdin().lock()));
    }
    let file = open_noatime(Path::new(name))?;
    if file.metadata()?.is_dir() {
        #[cfg(unix)]
        return Err(io::Error::from_raw_os_error(libc::EISDIR));
        #[cfg(not(unix))]
        return Err(io::Error::from(io::ErrorKind::IsADirectory));
    }
    Ok(Input::File(file))
}

/// Single read into `buf`, retrying reads interrupted by a signal.
/// Returns 0 only at end of stream (or when `buf` is empty).
#[inline]
pub fn read_retrying(reader: &mut impl Read, buf: &mut [u8]) -> io::Result<usize> {
    loop {
        match reader.read(buf) {
            Ok(n) => return Ok(n),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e), // ENOENT, EACCES, ...: report it
        }
    }
}
