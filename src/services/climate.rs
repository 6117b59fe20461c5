use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ClimateDescriptor {
    pub season: String,
    pub descriptor: String,
    pub avg_high_c: i32,
}

pub struct ClimateService;

impl ClimateService {
    /// Look up the climate/season descriptor for a destination and month.
    /// Unknown destinations fall back to a northern-hemisphere temperate
    /// profile.
    pub fn lookup(destination_id: &str, month: u32) -> ClimateDescriptor {
        let month = month.clamp(1, 12);
        let (southern, tropical, descriptor, highs) = Self::destination_profile(destination_id);

        if tropical {
            let wet = (5..=10).contains(&month);
            return ClimateDescriptor {
                season: if wet { "wet".to_string() } else { "dry".to_string() },
                descriptor: descriptor.to_string(),
                avg_high_c: highs[2],
            };
        }

        let season = Self::season_for_month(month, southern);
        let avg_high_c = match season {
            "winter" => highs[0],
            "spring" => highs[1],
            "summer" => highs[2],
            _ => highs[3],
        };

        ClimateDescriptor {
            season: season.to_string(),
            descriptor: descriptor.to_string(),
            avg_high_c,
        }
    }

    /// (southern hemisphere, tropical, descriptor, seasonal highs
    /// [winter, spring, summer, autumn])
    fn destination_profile(destination_id: &str) -> (bool, bool, &'static str, [i32; 4]) {
        match destination_id.to_lowercase().as_str() {
            "tokyo" | "kyoto" | "osaka" => (false, false, "humid subtropical", [10, 18, 31, 21]),
            "paris" | "london" | "amsterdam" => (false, false, "oceanic", [7, 14, 24, 15]),
            "rome" | "barcelona" | "lisbon" | "athens" => {
                (false, false, "mediterranean", [13, 18, 30, 21])
            }
            "new-york" | "chicago" | "toronto" => (false, false, "humid continental", [3, 14, 28, 16]),
            "denver" | "salt-lake-city" => (false, false, "semi-arid highland", [7, 16, 31, 18]),
            "mexico-city" => (false, false, "subtropical highland", [22, 26, 24, 22]),
            "sydney" | "melbourne" | "auckland" => (true, false, "temperate oceanic", [16, 20, 26, 21]),
            "buenos-aires" | "santiago" => (true, false, "humid subtropical", [15, 20, 29, 22]),
            "cape-town" => (true, false, "mediterranean", [18, 21, 27, 23]),
            "bangkok" | "singapore" | "bali" => (false, true, "tropical", [33, 33, 33, 33]),
            "reykjavik" => (false, false, "subpolar oceanic", [2, 6, 13, 7]),
            _ => (false, false, "temperate", [8, 16, 27, 17]),
        }
    }

    fn season_for_month(month: u32, southern: bool) -> &'static str {
        let month = if southern { (month + 5) % 12 + 1 } else { month };
        match month {
            12 | 1 | 2 => "winter",
            3..=5 => "spring",
            6..=8 => "summer",
            _ => "autumn",
        }
    }
}
