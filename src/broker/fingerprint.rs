//! Device fingerprint computed by the host broker.
//!
//! The fingerprint is a 32-bit MurmurHash3 (seed 256) over the browser
//! traits joined with `|`, the same key layout the host-page fingerprint
//! libraries use. It is only ever treated as an opaque identity.

/// Seed used for fingerprint hashing.
pub const FINGERPRINT_SEED: u32 = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceTraits {
    pub user_agent: String,
    pub screen: Screen,
    pub plugins: Vec<String>,
    pub fonts: Vec<String>,
    pub local_storage: bool,
    pub session_storage: bool,
    pub time_zone: String,
    pub language: String,
    pub system_language: String,
    pub cookies_enabled: bool,
    pub canvas: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Screen {
    pub width: u32,
    pub height: u32,
    pub color_depth: u32,
}

impl Screen {
    /// e.g. `Current Resolution: 1920x1080, Color Depth: 24`
    pub fn print(&self) -> String {
        format!(
            "Current Resolution: {}x{}, Color Depth: {}",
            self.width, self.height, self.color_depth
        )
    }
}

impl Default for DeviceTraits {
    fn default() -> Self {
        Self::desktop_chrome()
    }
}

impl DeviceTraits {
    /// A typical desktop Chrome on Windows.
    pub fn desktop_chrome() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
                .to_string(),
            screen: Screen {
                width: 1920,
                height: 1080,
                color_depth: 24,
            },
            plugins: vec!["PDF Viewer".to_string(), "Chrome PDF Viewer".to_string()],
            fonts: Vec::new(),
            local_storage: true,
            session_storage: true,
            time_zone: "+00".to_string(),
            language: "en-US".to_string(),
            system_language: "en-US".to_string(),
            cookies_enabled: true,
            canvas: String::new(),
        }
    }

    /// Pixel 7 running mobile Chrome.
    pub fn pixel_7() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (Linux; Android 13; Pixel 7) AppleWebKit/537.36 \
                (KHTML, like Gecko) Chrome/120.0.0.0 Mobile Safari/537.36"
                .to_string(),
            screen: Screen {
                width: 412,
                height: 915,
                color_depth: 24,
            },
            plugins: Vec::new(),
            ..Self::desktop_chrome()
        }
    }

    /// The string the fingerprint hashes.
    pub fn key(&self) -> String {
        [
            self.user_agent.clone(),
            self.screen.print(),
            self.plugins.join(", "),
            self.fonts.join(", "),
            self.local_storage.to_string(),
            self.session_storage.to_string(),
            self.time_zone.clone(),
            self.language.clone(),
            self.system_language.clone(),
            self.cookies_enabled.to_string(),
            self.canvas.clone(),
        ]
        .join("|")
    }

    pub fn fingerprint(&self) -> u32 {
        murmurhash3_32(self.key().as_bytes(), FINGERPRINT_SEED)
    }
}

/// MurmurHash3, x86 32-bit variant.
pub fn murmurhash3_32(key: &[u8], seed: u32) -> u32 {
    const C1: u32 = 0xcc9e_2d51;
    const C2: u32 = 0x1b87_3593;

    let mut h1 = seed;
    let chunks = key.chunks_exact(4);
    let tail = chunks.remainder();

    for chunk in chunks {
        let mut k1 = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        k1 = k1.wrapping_mul(C1).rotate_left(15).wrapping_mul(C2);
        h1 ^= k1;
        h1 = h1.rotate_left(13).wrapping_mul(5).wrapping_add(0xe654_6b64);
    }

    if !tail.is_empty() {
        let mut k1 = 0u32;
        for (i, byte) in tail.iter().enumerate() {
            k1 ^= u32::from(*byte) << (8 * i);
        }
        k1 = k1.wrapping_mul(C1).rotate_left(15).wrapping_mul(C2);
        h1 ^= k1;
    }

    h1 ^= key.len() as u32;
    h1 ^= h1 >> 16;
    h1 = h1.wrapping_mul(0x85eb_ca6b);
    h1 ^= h1 >> 13;
    h1 = h1.wrapping_mul(0xc2b2_ae35);
    h1 ^= h1 >> 16;
    h1
}
