use std::io::{self, Write};
#[cfg(unix)]
use std::mem::ManuallyDrop;
#[cfg(unix)]
use std::os::unix::io::FromRawFd;
use std::process;

use clap::Parser;

use b64stream::base64::{self as b64, EncodeError, StreamEncoder};
use b64stream::common::io::open_input;
use b64stream::common::{io_error_msg, reset_sigpipe};

const TOOL: &str = "b64enc";

#[derive(Parser)]
#[command(
    name = "b64enc",
    about = "Base64 encode FILE, or standard input, to standard output.",
    after_help = "With no FILE, or when FILE is -, read standard input.\n\n\
        The data are encoded as described for the base64 alphabet in RFC 4648.\n\
        Output is a single unwrapped line with no trailing newline.\n\n\
        Set B64ENC_LOG=debug to trace encoding sessions on stderr.",
    version
)]
struct Cli {
    /// Read input in blocks of BYTES (3 to 268435456)
    #[arg(
        short = 'b',
        long = "block-size",
        value_name = "BYTES",
        default_value_t = b64::DEFAULT_BLOCK_SIZE,
        value_parser = parse_block_size
    )]
    block_size: usize,

    /// File to encode (reads stdin if omitted or -)
    file: Option<String>,
}

fn parse_block_size(s: &str) -> Result<usize, String> {
    let n: usize = s
        .parse()
        .map_err(|_| format!("invalid block size: '{}'", s))?;
    if !(b64::MIN_BLOCK_SIZE..=b64::MAX_BLOCK_SIZE).contains(&n) {
        return Err(format!(
            "block size must be between {} and {}",
            b64::MIN_BLOCK_SIZE,
            b64::MAX_BLOCK_SIZE
        ));
    }
    Ok(n)
}

/// Raw fd stdout on Unix. The encoder already batches each block into a
/// single write, so no intermediate buffering is needed.
#[cfg(unix)]
#[inline]
fn raw_stdout() -> ManuallyDrop<std::fs::File> {
    unsafe { ManuallyDrop::new(std::fs::File::from_raw_fd(1)) }
}

fn main() {
    reset_sigpipe();

    env_logger::Builder::from_env(env_logger::Env::new().filter_or("B64ENC_LOG", "warn"))
        .format_timestamp(None)
        .init();

    // Usage errors exit 1 like GNU tools; --help/--version go to stdout with 0.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if !e.use_stderr() => e.exit(),
        Err(e) => {
            let _ = e.print();
            process::exit(1);
        }
    };
    let filename = cli.file.as_deref().unwrap_or("-");

    let mut input = match open_input(filename) {
        Ok(input) => input,
        Err(e) => {
            eprintln!("{}: {}: {}", TOOL, filename, io_error_msg(&e));
            process::exit(1);
        }
    };

    let mut encoder = match StreamEncoder::new(cli.block_size) {
        Ok(encoder) => encoder,
        Err(e) => {
            eprintln!("{}: {}", TOOL, e);
            process::exit(1);
        }
    };

    #[cfg(unix)]
    let result = {
        let mut raw = raw_stdout();
        encoder.encode(&mut input, &mut *raw)
    };
    #[cfg(not(unix))]
    let result = {
        let stdout = io::stdout();
        let capacity = b64::encoded_len(encoder.block_size());
        let mut out = io::BufWriter::with_capacity(capacity, stdout.lock());
        encoder.encode(&mut input, &mut out)
    };

    match result {
        Ok(summary) => {
            log::info!(
                "encoded {} bytes into {} base64 symbols",
                summary.bytes_in,
                summary.bytes_out
            );
        }
        Err(e) => {
            report(filename, &e);
            process::exit(1);
        }
    }
}

fn report(filename: &str, e: &EncodeError) {
    let detail = e.io_error().map(io_error_msg).unwrap_or_default();
    match e {
        EncodeError::Read(_) if filename != "-" => {
            eprintln!("{}: {}: {}", TOOL, filename, detail)
        }
        EncodeError::Read(_) | EncodeError::Write(_) => eprintln!("{}: {}: {}", TOOL, e, detail),
        EncodeError::BlockSize { .. } | EncodeError::Alloc { .. } => eprintln!("{}: {}", TOOL, e),
    }
    let _ = io::stderr().flush();
}
