use sha2::{Digest, Sha256};
use uuid::Uuid;

const MAX_SLUG_LEN: usize = 24;

/// Generates `<name-slug>-<4 hex>` ids, retrying while `exists` reports a clash.
pub fn generate_plant_id<F>(common_name: &str, mut exists: F) -> String
where
    F: FnMut(&str) -> bool,
{
    let slug = name_slug(common_name);

    for _ in 0..64 {
        let seed = Uuid::now_v7().to_string();
        let mut hasher = Sha256::new();
        hasher.update(seed.as_bytes());
        let digest = format!("{:x}", hasher.finalize());
        let candidate = format!("{}-{}", slug, &digest[..4]);
        if !exists(&candidate) {
            return candidate;
        }
    }

    format!("{}-{}", slug, &Uuid::now_v7().simple().to_string()[..12])
}

pub fn name_slug(raw: &str) -> String {
    let mut slug = String::new();
    for ch in raw.trim().chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
        if slug.len() >= MAX_SLUG_LEN {
            break;
        }
    }
    let slug = slug.trim_end_matches('-');
    if slug.is_empty() {
        "plant".to_string()
    } else {
        slug.to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::{generate_plant_id, name_slug};

    #[test]
    fn slug_keeps_ascii_words() {
        assert_eq!(name_slug("Fiddle-leaf fig"), "fiddle-leaf-fig");
        assert_eq!(name_slug("  Monstera  deliciosa "), "monstera-deliciosa");
        assert_eq!(name_slug("Árbol"), "rbol");
        assert_eq!(name_slug("???"), "plant");
        assert!(name_slug(&"a".repeat(80)).len() <= 24);
    }

    #[test]
    fn generated_ids_follow_slug_short_hash_shape() {
        let id = generate_plant_id("Snake plant", |_| false);
        let (prefix, hash) = id.rsplit_once('-').expect("id should have a hash suffix");
        assert_eq!(prefix, "snake-plant");
        assert_eq!(hash.len(), 4);
        assert!(hash.chars().all(|ch| ch.is_ascii_hexdigit()));
    }

    #[test]
    fn colliding_candidates_are_skipped() {
        let mut rejected = HashSet::new();
        let mut attempts = 0;
        let id = generate_plant_id("Pothos", |candidate| {
            attempts += 1;
            if attempts <= 3 {
                rejected.insert(candidate.to_string());
                return true;
            }
            rejected.contains(candidate)
        });
        assert!(attempts >= 4);
        assert!(!rejected.contains(&id));
        assert!(id.starts_with("pothos-"));
    }
}
