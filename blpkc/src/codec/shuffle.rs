//! Byte shuffle preconditioning filter, applied once over a whole chunk
//! buffer before splitting into blocks. Improves the ratio of the block
//! codecs on typed numeric data by grouping same-significance bytes of
//! adjacent elements together.

/// Shuffle `src` (a buffer of `src.len() / typesize` elements of `typesize`
/// bytes each) into `dest`. Bytes left over after the last full element are
/// copied through unshuffled.
pub fn shuffle(typesize: usize, src: &[u8], dest: &mut [u8]) {
    debug_assert_eq!(src.len(), dest.len());
    if typesize <= 1 {
        dest.copy_from_slice(src);
        return;
    }
    let nelements = src.len() / typesize;
    let rem = src.len() % typesize;

    for j in 0..typesize {
        for i in 0..nelements {
            dest[j * nelements + i] = src[i * typesize + j];
        }
    }

    let start = src.len() - rem;
    dest[start..].copy_from_slice(&src[start..]);
}

/// Inverse of [`shuffle`].
pub fn unshuffle(typesize: usize, src: &[u8], dest: &mut [u8]) {
    debug_assert_eq!(src.len(), dest.len());
    if typesize <= 1 {
        dest.copy_from_slice(src);
        return;
    }
    let nelements = src.len() / typesize;
    let rem = src.len() % typesize;

    for i in 0..nelements {
        for j in 0..typesize {
            dest[i * typesize + j] = src[j * nelements + i];
        }
    }

    let start = src.len() - rem;
    dest[start..].copy_from_slice(&src[start..]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_exact_multiple() {
        let data: Vec<u8> = (0..40u8).collect();
        let mut shuffled = vec![0u8; data.len()];
        shuffle(4, &data, &mut shuffled);
        assert_ne!(shuffled, data);
        let mut back = vec![0u8; data.len()];
        unshuffle(4, &shuffled, &mut back);
        assert_eq!(back, data);
    }

    #[test]
    fn round_trip_with_remainder() {
        let data: Vec<u8> = (0..37u8).collect();
        let mut shuffled = vec![0u8; data.len()];
        shuffle(8, &data, &mut shuffled);
        let mut back = vec![0u8; data.len()];
        unshuffle(8, &shuffled, &mut back);
        assert_eq!(back, data);
    }

    #[test]
    fn typesize_one_is_identity() {
        let data: Vec<u8> = (0..10u8).collect();
        let mut out = vec![0u8; data.len()];
        shuffle(1, &data, &mut out);
        assert_eq!(out, data);
    }
}
