//! Harmonic compatibility table
//!
//! Static circle-of-fifths lookup used for harmonic mixing: each key maps to
//! the keys a DJ can blend into without a clash: the key itself, its perfect
//! fifth, its relative minor, and the fifth's relative minor. The minor
//! entries are a fixed notation convention, not detected from audio.
//!
//! Read-only for the process lifetime; grouping buckets on exact detected
//! pitch class, this table serves cross-bucket ordering decisions.

use crate::types::{KeySignature, PitchClass};

/// Compatible keys for a detected pitch class, most-compatible first
///
/// Layout per entry: [itself, perfect fifth, relative minor, fifth's relative
/// minor]. Covers all 12 pitch classes.
pub fn compatible_keys(key: PitchClass) -> [KeySignature; 4] {
    use PitchClass::*;
    let (fifth, relative, fifth_relative) = match key {
        C => (G, A, E),
        Cs => (Gs, As, F),
        D => (A, B, Fs),
        Ds => (As, C, G),
        E => (B, Cs, Gs),
        F => (C, D, A),
        Fs => (Cs, Ds, As),
        G => (D, E, B),
        Gs => (Ds, F, C),
        A => (E, Fs, Cs),
        As => (F, G, D),
        B => (Fs, Gs, Ds),
    };
    [
        KeySignature::major(key),
        KeySignature::major(fifth),
        KeySignature::minor(relative),
        KeySignature::minor(fifth_relative),
    ]
}

/// True if `candidate` is harmonically compatible with `key`
pub fn is_compatible(key: PitchClass, candidate: KeySignature) -> bool {
    compatible_keys(key).contains(&candidate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Mode;

    #[test]
    fn c_major_neighbors() {
        let keys = compatible_keys(PitchClass::C);
        assert_eq!(keys[0], KeySignature::major(PitchClass::C));
        assert_eq!(keys[1], KeySignature::major(PitchClass::G));
        assert_eq!(keys[2], KeySignature::minor(PitchClass::A));
        assert_eq!(keys[3], KeySignature::minor(PitchClass::E));
    }

    #[test]
    fn table_covers_all_pitch_classes() {
        for i in 0..12 {
            let key = PitchClass::from_index(i);
            let keys = compatible_keys(key);
            assert_eq!(keys.len(), 4);
            // A key is always compatible with itself
            assert_eq!(keys[0].pitch_class, key);
            assert_eq!(keys[0].mode, Mode::Major);
        }
    }

    #[test]
    fn fifth_is_seven_semitones_up() {
        for i in 0..12 {
            let key = PitchClass::from_index(i);
            let fifth = compatible_keys(key)[1].pitch_class;
            assert_eq!(fifth.to_index(), (key.to_index() + 7) % 12);
        }
    }

    #[test]
    fn relative_minor_is_nine_semitones_up() {
        for i in 0..12 {
            let key = PitchClass::from_index(i);
            let relative = compatible_keys(key)[2].pitch_class;
            assert_eq!(relative.to_index(), (key.to_index() + 9) % 12);
        }
    }

    #[test]
    fn compatibility_check() {
        assert!(is_compatible(
            PitchClass::D,
            KeySignature::minor(PitchClass::B)
        ));
        assert!(!is_compatible(
            PitchClass::D,
            KeySignature::major(PitchClass::Ds)
        ));
    }
}
