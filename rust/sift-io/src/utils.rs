/// Reads from `read` until the buffer is full or end of input is reached.
/// Returns the number of bytes placed in the buffer.
pub fn read_fully<R: std::io::Read>(mut read: R, buffer: &mut [u8]) -> std::io::Result<usize> {
    let mut pos: usize = 0;
    loop {
        let r = read.read(&mut buffer[pos..]);
        match r {
            Ok(0) => return Ok(pos),
            Ok(bytes) => {
                pos += bytes;
                if pos == buffer.len() {
                    return Ok(pos);
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::read_fully;

    #[test]
    fn test_read_fully_short_input() {
        let data = [1u8, 2, 3];
        let mut buf = [0u8; 8];
        let n = read_fully(&data[..], &mut buf).unwrap();
        assert_eq!(n, 3);
        assert_eq!(&buf[..3], &data);
    }
}
