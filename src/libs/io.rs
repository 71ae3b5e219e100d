use std::io::{BufRead, BufReader, BufWriter, Read, Write};

/// Open an input source for buffered reading.
///
/// `stdin` reads standard input; files ending in `.gz` are decompressed
/// transparently.
///
/// ```
/// use std::io::BufRead;
/// let reader = cnp::reader("tests/cnp/profiles.csv");
/// assert!(reader.lines().count() > 1);
/// ```
pub fn reader(input: &str) -> Box<dyn BufRead> {
    let reader: Box<dyn BufRead> = if input == "stdin" {
        Box::new(BufReader::new(std::io::stdin()))
    } else {
        let path = std::path::Path::new(input);
        let file = match std::fs::File::open(path) {
            Err(why) => panic!("could not open {}: {}", path.display(), why),
            Ok(file) => file,
        };

        if path.extension() == Some(std::ffi::OsStr::new("gz")) {
            Box::new(BufReader::new(flate2::read::MultiGzDecoder::new(file)))
        } else {
            Box::new(BufReader::new(file))
        }
    };

    reader
}

/// Open an output sink for buffered writing. `stdout` writes standard output.
pub fn writer(output: &str) -> Box<dyn Write> {
    let writer: Box<dyn Write> = if output == "stdout" {
        Box::new(BufWriter::new(std::io::stdout()))
    } else {
        Box::new(BufWriter::new(std::fs::File::create(output).unwrap()))
    };

    writer
}

/// Slurp an entire input source into a string.
pub fn read_to_string(input: &str) -> anyhow::Result<String> {
    let mut s = String::new();
    reader(input).read_to_string(&mut s)?;
    Ok(s)
}
