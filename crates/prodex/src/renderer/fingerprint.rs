//! Desktop Chrome fingerprints for the full-browser strategy.

use super::Viewport;
use rand::seq::SliceRandom;
use rand::Rng;
use std::time::Duration;

struct Profile {
    /// Token between `Mozilla/5.0 (` and `)`.
    os: &'static str,
    platform: &'static str,
    ua_platform: &'static str,
}

const PROFILES: &[Profile] = &[
    Profile {
        os: "Macintosh; Intel Mac OS X 10_15_7",
        platform: "MacIntel",
        ua_platform: "\"macOS\"",
    },
    Profile {
        os: "Windows NT 10.0; Win64; x64",
        platform: "Win32",
        ua_platform: "\"Windows\"",
    },
    Profile {
        os: "X11; Linux x86_64",
        platform: "Linux x86_64",
        ua_platform: "\"Linux\"",
    },
];

const VIEWPORTS: &[(u32, u32)] = &[
    (1920, 1080),
    (1680, 1050),
    (1536, 864),
    (1440, 900),
    (1366, 768),
];

const CHROME_MAJORS: std::ops::RangeInclusive<u32> = 120..=124;

/// Waypoints the pointer visits after the page loads.
const POINTER_PATH: &[(f64, f64)] = &[(100.0, 100.0), (500.0, 300.0)];

/// A coherent desktop browser identity.
#[derive(Debug, Clone, PartialEq)]
pub struct Fingerprint {
    pub user_agent: String,
    /// `navigator.platform`
    pub platform: String,
    /// `Sec-Ch-Ua-Platform` value, quoted.
    pub ua_platform: String,
    pub chrome_major: u32,
    pub accept_language: String,
    pub viewport: Viewport,
    pub pointer_path: Vec<(f64, f64)>,
    /// Pause range between pointer moves, in milliseconds.
    pub pointer_pause_ms: (u64, u64),
}

impl Fingerprint {
    pub fn generate() -> Self {
        Self::generate_with(&mut rand::thread_rng())
    }

    pub fn generate_with<R: Rng>(rng: &mut R) -> Self {
        let profile = PROFILES.choose(rng).unwrap_or(&PROFILES[0]);
        let (width, height) = *VIEWPORTS.choose(rng).unwrap_or(&VIEWPORTS[0]);
        let chrome_major = rng.gen_range(CHROME_MAJORS);
        let device_scale_factor = if profile.platform == "MacIntel" && rng.gen_bool(0.5) {
            2.0
        } else {
            1.0
        };

        Self {
            user_agent: format!(
                "Mozilla/5.0 ({}) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/{chrome_major}.0.0.0 Safari/537.36",
                profile.os
            ),
            platform: profile.platform.to_string(),
            ua_platform: profile.ua_platform.to_string(),
            chrome_major,
            accept_language: "en-US,en;q=0.9".to_string(),
            viewport: Viewport {
                width,
                height,
                device_scale_factor,
            },
            pointer_path: POINTER_PATH.to_vec(),
            pointer_pause_ms: (50, 250),
        }
    }

    /// `Sec-Ch-Ua` brand list matching the user agent.
    pub fn sec_ch_ua(&self) -> String {
        format!(
            "\"Not_A Brand\";v=\"8\", \"Chromium\";v=\"{v}\", \"Google Chrome\";v=\"{v}\"",
            v = self.chrome_major
        )
    }

    /// Request headers a real browser with this identity would send.
    pub fn headers(&self) -> Vec<(String, String)> {
        let brands = self.sec_ch_ua();
        [
            ("User-Agent", self.user_agent.as_str()),
            (
                "Accept",
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,image/apng,*/*;q=0.8",
            ),
            ("Accept-Language", self.accept_language.as_str()),
            ("Cache-Control", "no-cache"),
            ("Pragma", "no-cache"),
            ("Sec-Ch-Ua", brands.as_str()),
            ("Sec-Ch-Ua-Mobile", "?0"),
            ("Sec-Ch-Ua-Platform", self.ua_platform.as_str()),
            ("Sec-Fetch-Dest", "document"),
            ("Sec-Fetch-Mode", "navigate"),
            ("Sec-Fetch-Site", "none"),
            ("Sec-Fetch-User", "?1"),
            ("Upgrade-Insecure-Requests", "1"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    /// A pause drawn from [`Fingerprint::pointer_pause_ms`].
    pub fn pointer_pause(&self) -> Duration {
        let (lo, hi) = self.pointer_pause_ms;
        if hi <= lo {
            return Duration::from_millis(lo);
        }
        Duration::from_millis(rand::thread_rng().gen_range(lo..=hi))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_generated_identity_is_consistent() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            let fp = Fingerprint::generate_with(&mut rng);
            assert!(fp
                .user_agent
                .contains(&format!("Chrome/{}.0.0.0", fp.chrome_major)));
            assert!(fp.sec_ch_ua().contains(&fp.chrome_major.to_string()));
            assert!(CHROME_MAJORS.contains(&fp.chrome_major));
            if fp.platform != "MacIntel" {
                assert_eq!(fp.viewport.device_scale_factor, 1.0);
            }
        }
    }

    #[test]
    fn test_headers_carry_user_agent() {
        let fp = Fingerprint::generate();
        let headers = fp.headers();
        assert!(headers
            .iter()
            .any(|(k, v)| k == "User-Agent" && *v == fp.user_agent));
        assert!(headers.iter().any(|(k, _)| k == "Sec-Ch-Ua-Platform"));
    }

    #[test]
    fn test_pointer_pause_in_range() {
        let fp = Fingerprint::generate();
        for _ in 0..20 {
            let ms = fp.pointer_pause().as_millis() as u64;
            assert!((fp.pointer_pause_ms.0..=fp.pointer_pause_ms.1).contains(&ms));
        }
    }
}
