pub const VERSION_MARKER: char = 'v';

/// Applied in order to an APK file name, e.g. `kodi-21.0_rc1-Isengard-armeabi-v7a.apk`.
const REPLACEMENTS: [(&str, &str); 16] = [
    ("kodi-", ""),
    ("-Isengard", ""),
    ("-Jarvis", ""),
    ("-Krypton", ""),
    ("-Leia", ""),
    ("-Matrix", ""),
    ("-Nexus", ""),
    ("-Omega", ""),
    ("-Piers", ""),
    ("_rc", "-RC"),
    ("_alpha", "-ALPHA"),
    ("_beta", "-BETA"),
    ("-armeabi-v7a.apk", ""),
    ("-arm64-v8a.apk", ""),
    ("-x86_64.apk", ""),
    (".apk", ""),
];

/// Any version that differs from the installed one counts as newer, the listing only ever
/// publishes a single latest artifact.
pub fn is_newer(current: &str, candidate: &str) -> bool {
    current != candidate
}

pub fn derive_version(apk_name: &str) -> Option<String> {
    let apk_name = apk_name.trim();
    if apk_name.is_empty() {
        return None;
    }

    let version = REPLACEMENTS
        .iter()
        .fold(apk_name.to_string(), |name, (from, to)| name.replace(from, to));

    if version.starts_with(VERSION_MARKER) {
        Some(version)
    } else {
        Some(format!("{VERSION_MARKER}{version}"))
    }
}

#[cfg(test)]
mod tests {
    use super::{derive_version, is_newer};

    #[test]
    fn test_is_newer_is_inequality() {
        assert!(!is_newer("v20.0", "v20.0"));
        assert!(is_newer("v20.0", "v21.0-RC1"));
        assert!(is_newer("v21.0", "v20.0"));
        assert!(is_newer("", "v20.0"));
    }

    #[test]
    fn test_derive_version_release_candidate() {
        assert_eq!(
            derive_version("kodi-21.0_rc1-Isengard-armeabi-v7a.apk"),
            Some("v21.0-RC1".to_string())
        );
    }

    #[test]
    fn test_derive_version_release() {
        assert_eq!(
            derive_version("kodi-15.2-Isengard-armeabi-v7a.apk"),
            Some("v15.2".to_string())
        );
        assert_eq!(derive_version("kodi-21.1-Omega-arm64-v8a.apk"), Some("v21.1".to_string()));
    }

    #[test]
    fn test_derive_version_alpha_and_beta() {
        assert_eq!(
            derive_version("kodi-16.0_alpha2-Jarvis-armeabi-v7a.apk"),
            Some("v16.0-ALPHA2".to_string())
        );
        assert_eq!(
            derive_version("kodi-22.0_beta1-Piers-armeabi-v7a.apk"),
            Some("v22.0-BETA1".to_string())
        );
    }

    #[test]
    fn test_derive_version_empty() {
        assert_eq!(derive_version(""), None);
        assert_eq!(derive_version("   "), None);
    }

    #[test]
    fn test_derive_version_is_idempotent() {
        for name in [
            "kodi-21.0_rc1-Isengard-armeabi-v7a.apk",
            "kodi-15.2-Isengard-armeabi-v7a.apk",
            "kodi-16.0_alpha2-Jarvis-armeabi-v7a.apk",
            "kodi-20.2-Nexus-arm64-v8a.apk",
        ] {
            let once = derive_version(name).unwrap();
            assert_eq!(derive_version(&once), Some(once.clone()), "{name}");
        }
    }
}
