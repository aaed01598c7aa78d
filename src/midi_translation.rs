const NOTE_NAMES: [&str; 12] = ["c", "db", "d", "eb", "e", "f", "gb",
"g", "ab", "a", "bb", "b"];

// Middle C (60) is "c4", so note 0 lands in octave -1.
pub fn tone_to_oletter(tone: u8) -> String {

    let letter = NOTE_NAMES[tone as usize % NOTE_NAMES.len()];
    let octave = (tone / 12) as i32 - 1;

    format!("{}{}", letter, octave)

}
