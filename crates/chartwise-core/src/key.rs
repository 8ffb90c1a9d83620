//! Dedup keys for (song, artist) pairs.
//!
//! A key is the song title immediately followed by the artist name, with
//! no separator and no case folding. Snapshots written by earlier runs are
//! keyed this way, so the derivation must stay stable. The price is that
//! pairs whose concatenations coincide ("Lo" + "veSong" and
//! "Love" + "Song") share a key; the store keeps whichever arrived first.

/// Derive the store key for a song title and artist name.
#[must_use]
pub fn dedup_key(title: &str, artist: &str) -> String {
    let mut key = String::with_capacity(title.len() + artist.len());
    key.push_str(title);
    key.push_str(artist);
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_is_plain_concatenation() {
        assert_eq!(dedup_key("Hello", "Adele"), "HelloAdele");
        assert_eq!(
            dedup_key("Shake It Off", "Taylor Swift"),
            "Shake It OffTaylor Swift"
        );
    }

    #[test]
    fn test_key_is_case_sensitive() {
        assert_ne!(dedup_key("hello", "adele"), dedup_key("Hello", "Adele"));
    }

    #[test]
    fn test_key_collides_across_split_points() {
        assert_eq!(dedup_key("Lo", "veSong"), dedup_key("Love", "Song"));
    }

    #[test]
    fn test_key_with_empty_parts() {
        assert_eq!(dedup_key("", "Adele"), "Adele");
        assert_eq!(dedup_key("Hello", ""), "Hello");
    }
}
