use std::{
    fs::File,
    io::{self, BufReader, BufWriter, Read, Write},
    path::Path,
};

/// Reads the whole file at `path` into memory
pub fn read(path: impl AsRef<Path>) -> io::Result<Vec<u8>> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut data = Vec::new();
    reader.read_to_end(&mut data)?;
    Ok(data)
}

/// Writes `data` to `path`, creating or truncating the file
pub fn write(path: impl AsRef<Path>, data: &[u8]) -> io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    writer.write_all(data)?;
    writer.flush()?; // Surface write errors here rather than on drop
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::ErrorKind;
    use tempfile::tempdir;

    #[test]
    fn test_write_then_read() -> io::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("out.txt");
        write(&path, b"hello |f6|")?;
        assert_eq!(read(&path)?, b"hello |f6|");
        Ok(())
    }

    #[test]
    fn test_write_truncates() -> io::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("out.txt");
        write(&path, b"a much longer first version")?;
        write(&path, b"short")?;
        assert_eq!(read(&path)?, b"short");
        Ok(())
    }

    #[test]
    fn test_read_missing_file() {
        let dir = tempdir().unwrap();
        let result = read(dir.path().join("nope.txt"));
        assert_eq!(result.err().unwrap().kind(), ErrorKind::NotFound);
    }
}
