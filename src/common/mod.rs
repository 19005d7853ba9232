pub mod io;


/// Reset SIGPIPE to default behavior (SIG_DFL) before the first write to stdout.
/// Rust ignores SIGPIPE, which would turn `b64enc | head -c 10` into a
/// "Broken pipe" diagnostic; with SIG_DFL the encoder is killed quietly like
/// any other filter (exit code 141 = 128 + 13). Call once at the top of main().
#[inline]
pub fn reset_sigpipe() {
    #[cfg(unix)]
    unsafe {
        libc::signal(libc::SIGPIPE, libc::SIG_DFL);
    }
}

/// Render an I/O error for a `b64enc: FILE: MESSAGE` diagnostic.
/// Rust's Display impl appends " (os error N)" to OS errors, e.g.
/// "No such file or directory (os error 2)"; the diagnostic keeps only the
/// strerror text. Non-OS errors (from custom readers) print unchanged.
pub fn io_error_msg(e: &std::io::Error) -> String {
    if let Some(raw) = e.raw_os_error() {
        let os_err = std::io::Error::from_raw_os_error(raw);
        let msg = format!("{}", os_err);
        msg.replace(&format!(" (os error {})", raw), "")
    } else {
        format!("{}", e)
    }
}
