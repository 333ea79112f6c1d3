use crate::device::types::{HeadingSample, Reading, WindSample};

/// `$WIMWV,<angle>,R,<speed>,N,A*` : relative (apparent) wind, speed in knots.
pub fn wind_sentence(wind: &WindSample) -> String {
    format!("$WIMWV,{:.1},R,{:.1},N,A*\n", wind.apparent_angle_deg, wind.apparent_speed_kts)
}

/// `$WIHDM,<heading>,M*` : magnetic heading.
pub fn heading_sentence(heading: &HeadingSample) -> String {
    format!("$WIHDM,{:.1},M*\n", heading.heading_deg)
}

/// Render the sentences for one reading, wind first. Fields that failed to decode are skipped.
pub fn encode(reading: &Reading) -> Vec<String> {
    let mut sentences = Vec::with_capacity(2);

    if let Ok(wind) = &reading.wind {
        sentences.push(wind_sentence(wind));
    }

    if let Ok(Some(heading)) = &reading.heading {
        sentences.push(heading_sentence(heading));
    }

    sentences
}
