use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use anyhow::{Context, Error};
use serde_json::{Map, Number, Value};
use crate::utils::coordinate::{FrameLandmarks, Landmark, LandmarkSequence, NUM_POSE_LANDMARKS, PoseLandmark};

const FIELD_FRAME: &str = "frame";
const FIELD_LANDMARKS: &str = "landmarks";
const LANDMARK_FIELDS: [&str; 4] = ["x", "y", "z", "visibility"];

/// to_document converts a landmark sequence into its JSON form.
///
/// Each entry is either `null` (no subject in that frame) or
/// `{"frame": i, "landmarks": {NAME: {"x", "y", "z", "visibility"}}}` with the
/// landmark names in detector order. JSON has no encoding for NaN, so a
/// non-finite coordinate is written as `null`.
///
/// # Arguments
/// * `sequence` - &LandmarkSequence
///
/// # Returns
/// * `Value`
pub fn to_document(sequence: &LandmarkSequence) -> Value {
    let entries = sequence
        .iter()
        .map(|entry| match entry {
            None => Value::Null,
            Some(frame) => frame_to_value(frame),
        })
        .collect();
    Value::Array(entries)
}

fn frame_to_value(frame: &FrameLandmarks) -> Value {
    let mut landmarks = Map::with_capacity(NUM_POSE_LANDMARKS);
    for (name, lmk) in frame.iter() {
        landmarks.insert(name.name().to_string(), landmark_to_value(lmk));
    }

    let mut record = Map::with_capacity(2);
    record.insert(FIELD_FRAME.to_string(), Value::from(frame.frame as u64));
    record.insert(FIELD_LANDMARKS.to_string(), Value::Object(landmarks));
    Value::Object(record)
}

fn landmark_to_value(lmk: &Landmark) -> Value {
    let mut fields = Map::with_capacity(LANDMARK_FIELDS.len());
    for (key, val) in LANDMARK_FIELDS.iter().zip([lmk.x, lmk.y, lmk.z, lmk.visibility]) {
        let number = match Number::from_f64(val as f64) {
            Some(number) => Value::Number(number),
            None => Value::Null,
        };
        fields.insert(key.to_string(), number);
    }
    Value::Object(fields)
}

/// from_document rebuilds a landmark sequence from its JSON form.
///
/// `null` entries come back as absent frames and `null` coordinates as NaN.
/// A record whose `frame` differs from its position in the array is rejected,
/// since the renderer relies on positional alignment.
///
/// # Arguments
/// * `document` - &Value produced by `to_document` or read from a landmark file
///
/// # Returns
/// * `Result<LandmarkSequence, Error>`
pub fn from_document(document: &Value) -> Result<LandmarkSequence, Error> {
    let entries = match document.as_array() {
        None => return Err(Error::msg("landmark document must be an array")),
        Some(entries) => entries,
    };

    let mut sequence: LandmarkSequence = Vec::with_capacity(entries.len());
    for (idx, entry) in entries.iter().enumerate() {
        match entry {
            Value::Null => sequence.push(None),
            Value::Object(record) => {
                let frame = frame_from_record(record)?;
                if frame.frame != idx {
                    return Err(Error::msg(format!(
                        "landmark record at position {idx} is tagged as frame {}", frame.frame
                    )))
                }
                sequence.push(Some(frame));
            }
            _ => {
                return Err(Error::msg(format!("landmark entry {idx} must be an object or null")))
            }
        }
    }
    Ok(sequence)
}

fn frame_from_record(record: &Map<String, Value>) -> Result<FrameLandmarks, Error> {
    let frame = match record.get(FIELD_FRAME).and_then(Value::as_u64) {
        None => return Err(Error::msg("landmark record has no valid `frame` index")),
        Some(frame) => frame as usize,
    };

    let named = match record.get(FIELD_LANDMARKS).and_then(Value::as_object) {
        None => return Err(Error::msg(format!("frame {frame}: `landmarks` must be an object"))),
        Some(named) => named,
    };

    if let Some(unknown) = named.keys().find(|key| PoseLandmark::from_name(key).is_none()) {
        return Err(Error::msg(format!("frame {frame}: unknown landmark `{unknown}`")))
    }

    let mut landmarks = [Landmark::nan(); NUM_POSE_LANDMARKS];
    for name in PoseLandmark::ALL {
        let fields = match named.get(name.name()).and_then(Value::as_object) {
            None => return Err(Error::msg(format!("frame {frame}: missing landmark `{}`", name.name()))),
            Some(fields) => fields,
        };

        let mut values = [f32::NAN; 4];
        for (val, key) in values.iter_mut().zip(LANDMARK_FIELDS) {
            *val = match fields.get(key) {
                Some(Value::Null) => f32::NAN,
                Some(Value::Number(number)) => number.as_f64().unwrap_or(f64::NAN) as f32,
                _ => {
                    return Err(Error::msg(format!(
                        "frame {frame}: landmark `{}` field `{key}` must be a number or null", name.name()
                    )))
                }
            };
        }
        landmarks[name.index()] = Landmark::new(values[0], values[1], values[2], values[3]);
    }
    Ok(FrameLandmarks::new(frame, landmarks))
}

/// write_landmarks persists the sequence as a JSON landmark file.
pub fn write_landmarks<P: AsRef<Path>>(path: P, sequence: &LandmarkSequence) -> Result<(), Error> {
    let path = path.as_ref();
    let file = File::create(path)
        .with_context(|| format!("cannot create landmark file {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, &to_document(sequence))?;
    writer.flush()?;
    Ok(())
}

/// read_landmarks loads a landmark file written by `write_landmarks`.
pub fn read_landmarks<P: AsRef<Path>>(path: P) -> Result<LandmarkSequence, Error> {
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("cannot open landmark file {}", path.display()))?;
    let document: Value = serde_json::from_reader(BufReader::new(file))?;
    from_document(&document)
}
