//! Daily weather generation with season-weighted probabilities.
//!
//! Weather is drawn once per in-game day. The distribution changes by
//! season (defaults shown; every row must sum to 1):
//!
//! | Weather  | Spring | Summer | Autumn | Winter |
//! |----------|--------|--------|--------|--------|
//! | Sunny    | 35%    | 50%    | 30%    | 22%    |
//! | Cloudy   | 30%    | 25%    | 32%    | 40%    |
//! | Rainy    | 20%    |  8%    | 20%    | 20%    |
//! | Stormy   | 10%    | 12%    | 12%    | 10%    |
//! | Special  |  5%    |  5%    |  6%    |  8%    |
//!
//! # Determinism
//!
//! The draw for a day is a pure function of `(world_seed, day, season)`:
//! a fresh [`SimRng`] stream is derived per day. Tomorrow's forecast is
//! therefore exactly the weather that will arrive, as long as the season
//! passed in for tomorrow is right.

use haven_types::{Season, SimRng, Weather};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::WorldError;

/// Salt separating the weather stream from spawn-point streams.
const WEATHER_SALT: u64 = 0x5745_4154_4845_5221;

/// Allowed deviation of a season row from a total of 1.
const SUM_TOLERANCE: f64 = 1e-6;

/// Probability of each weather state within one season.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeasonWeights {
    /// Probability of [`Weather::Sunny`].
    pub sunny: f64,
    /// Probability of [`Weather::Cloudy`].
    pub cloudy: f64,
    /// Probability of [`Weather::Rainy`].
    pub rainy: f64,
    /// Probability of [`Weather::Stormy`].
    pub stormy: f64,
    /// Probability of [`Weather::Special`].
    pub special: f64,
}

impl SeasonWeights {
    const fn new(sunny: f64, cloudy: f64, rainy: f64, stormy: f64, special: f64) -> Self {
        Self {
            sunny,
            cloudy,
            rainy,
            stormy,
            special,
        }
    }

    fn entries(&self) -> [(Weather, f64); 5] {
        [
            (Weather::Sunny, self.sunny),
            (Weather::Cloudy, self.cloudy),
            (Weather::Rainy, self.rainy),
            (Weather::Stormy, self.stormy),
            (Weather::Special, self.special),
        ]
    }

    /// Sum of all probabilities.
    pub fn total(&self) -> f64 {
        self.entries().iter().map(|(_, p)| p).sum()
    }

    /// Select a weather state for a uniform roll in `[0, 1)`.
    ///
    /// Walks the cumulative distribution; rounding slack at the top end
    /// falls through to the last state with non-zero weight.
    pub fn select(&self, roll: f64) -> Weather {
        let mut cumulative = 0.0;
        let mut last_possible = Weather::Sunny;
        for (weather, p) in self.entries() {
            if p > 0.0 {
                last_possible = weather;
            }
            cumulative += p;
            if roll < cumulative {
                return weather;
            }
        }
        last_possible
    }

    fn validate(&self, season: Season) -> Result<(), WorldError> {
        for (weather, p) in self.entries() {
            if !p.is_finite() || p < 0.0 {
                return Err(WorldError::InvalidWeatherTable {
                    season,
                    reason: format!("probability for {weather:?} must be a non-negative number"),
                });
            }
        }
        let total = self.total();
        if (total - 1.0).abs() > SUM_TOLERANCE {
            return Err(WorldError::InvalidWeatherTable {
                season,
                reason: format!("probabilities sum to {total}, expected 1"),
            });
        }
        Ok(())
    }
}

/// Season-indexed weather distribution, loaded from configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherTable {
    /// Spring probabilities.
    #[serde(default = "default_spring")]
    pub spring: SeasonWeights,
    /// Summer probabilities.
    #[serde(default = "default_summer")]
    pub summer: SeasonWeights,
    /// Autumn probabilities.
    #[serde(default = "default_autumn")]
    pub autumn: SeasonWeights,
    /// Winter probabilities.
    #[serde(default = "default_winter")]
    pub winter: SeasonWeights,
}

impl WeatherTable {
    /// Return the weights for a season.
    pub const fn for_season(&self, season: Season) -> &SeasonWeights {
        match season {
            Season::Spring => &self.spring,
            Season::Summer => &self.summer,
            Season::Autumn => &self.autumn,
            Season::Winter => &self.winter,
        }
    }

    /// Check that every season row is a probability distribution.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidWeatherTable`] naming the first bad season.
    pub fn validate(&self) -> Result<(), WorldError> {
        for season in Season::ALL {
            self.for_season(season).validate(season)?;
        }
        Ok(())
    }
}

impl Default for WeatherTable {
    fn default() -> Self {
        Self {
            spring: default_spring(),
            summer: default_summer(),
            autumn: default_autumn(),
            winter: default_winter(),
        }
    }
}

const fn default_spring() -> SeasonWeights {
    SeasonWeights::new(0.35, 0.30, 0.20, 0.10, 0.05)
}

const fn default_summer() -> SeasonWeights {
    SeasonWeights::new(0.50, 0.25, 0.08, 0.12, 0.05)
}

const fn default_autumn() -> SeasonWeights {
    SeasonWeights::new(0.30, 0.32, 0.20, 0.12, 0.06)
}

const fn default_winter() -> SeasonWeights {
    SeasonWeights::new(0.22, 0.40, 0.20, 0.10, 0.08)
}

/// Deterministic daily weather roller with a one-day forecast.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherRoller {
    /// The world seed used to derive per-day randomness.
    world_seed: u64,
    /// Validated distribution.
    table: WeatherTable,
    /// Weather in effect today.
    today: Weather,
    /// Weather drawn for tomorrow.
    forecast: Weather,
}

impl WeatherRoller {
    /// Create a roller and draw weather for `day` and the day after.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidWeatherTable`] if the table is malformed.
    pub fn new(
        world_seed: u64,
        table: WeatherTable,
        day: u32,
        season: Season,
        tomorrow_season: Season,
    ) -> Result<Self, WorldError> {
        table.validate()?;
        let today = draw(world_seed, &table, day, season);
        let forecast = draw(world_seed, &table, day.saturating_add(1), tomorrow_season);
        Ok(Self {
            world_seed,
            table,
            today,
            forecast,
        })
    }

    /// Rebuild a roller from persisted state.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidWeatherTable`] if the table is malformed.
    pub fn from_parts(
        world_seed: u64,
        table: WeatherTable,
        today: Weather,
        forecast: Weather,
    ) -> Result<Self, WorldError> {
        table.validate()?;
        Ok(Self {
            world_seed,
            table,
            today,
            forecast,
        })
    }

    /// Roll over to a new day: today's weather is drawn for `day` and a
    /// fresh forecast is drawn for `day + 1`. Returns today's weather.
    pub fn on_new_day(&mut self, day: u32, season: Season, tomorrow_season: Season) -> Weather {
        self.today = draw(self.world_seed, &self.table, day, season);
        self.forecast = draw(
            self.world_seed,
            &self.table,
            day.saturating_add(1),
            tomorrow_season,
        );
        debug!(day, today = ?self.today, forecast = ?self.forecast, "Weather rolled");
        self.today
    }

    /// Weather in effect today.
    pub const fn today(&self) -> Weather {
        self.today
    }

    /// Weather already drawn for tomorrow.
    pub const fn forecast(&self) -> Weather {
        self.forecast
    }

    /// Return the world seed.
    pub const fn world_seed(&self) -> u64 {
        self.world_seed
    }

    /// Return the distribution in use.
    pub const fn table(&self) -> &WeatherTable {
        &self.table
    }
}

/// Draw the weather for a day. Pure in `(world_seed, table, day, season)`.
pub fn draw(world_seed: u64, table: &WeatherTable, day: u32, season: Season) -> Weather {
    let mut rng = SimRng::for_day(world_seed, day, WEATHER_SALT);
    table.for_season(season).select(rng.unit())
}
