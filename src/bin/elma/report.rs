//! Render file summaries as text or JSON.
use std::collections::HashMap;
use std::path::Path;

use elma::lev::{Level, ListEntry, ObjectType};
use elma::rec::Replay;
use serde::Serialize;
use tinyjson::JsonValue;
use tinytemplate::TinyTemplate;

use super::{anchor_error, as_io_error, LocatedError};

const DEFAULT_TEMPLATE: &str = "{file}: {kind} \"{name}\", link {link}
{{ for fact in facts }}  {fact.key}: {fact.value}
{{ endfor }}";

/// What `info` knows about a file.
#[derive(Serialize)]
pub struct Summary {
    pub file: String,
    pub kind: &'static str,
    pub name: String,
    pub link: u32,
    pub facts: Vec<Fact>,
}

/// A single named property, pre-rendered for text and typed for JSON.
#[derive(Serialize)]
pub struct Fact {
    pub key: &'static str,
    pub value: String,
    #[serde(skip)]
    json: JsonValue,
}

impl Fact {
    fn count(key: &'static str, count: usize) -> Self {
        Fact {
            key,
            value: count.to_string(),
            json: JsonValue::Number(count as f64),
        }
    }

    fn text(key: &'static str, text: String) -> Self {
        Fact {
            key,
            json: JsonValue::String(text.clone()),
            value: text,
        }
    }

    fn flag(key: &'static str, flag: bool) -> Self {
        Fact {
            key,
            value: if flag { "yes" } else { "no" }.to_string(),
            json: JsonValue::Boolean(flag),
        }
    }
}

impl Summary {
    pub fn level(path: &Path, level: &Level) -> Self {
        let apples = level
            .objects
            .iter()
            .filter(|object| matches!(object.object_type, ObjectType::Apple { .. }))
            .count();
        let mut facts = vec![
            Fact::text("lgr", level.lgr.clone()),
            Fact::text("ground", level.ground.clone()),
            Fact::text("sky", level.sky.clone()),
            Fact::count("polygons", level.polygons.len()),
            Fact::count("objects", level.objects.len()),
            Fact::count("apples", apples),
            Fact::count("pictures", level.pictures.len()),
        ];
        if let Some(best) = level.top10_single.iter().map(|entry| entry.time).min() {
            facts.push(Fact::text("best", clock(i64::from(best))));
        }

        Summary {
            file: file_name(path),
            kind: "level",
            name: level.name.clone(),
            link: level.link,
            facts,
        }
    }

    pub fn replay(path: &Path, replay: &Replay) -> Self {
        let (time, finished) = replay.get_time_hs();
        let mut facts = vec![
            Fact::flag("multi", replay.multi),
            Fact::flag("flag_tag", replay.flag_tag),
            Fact::count("frames", replay.frames.len()),
            Fact::count("events", replay.events.len()),
        ];
        if replay.multi {
            facts.push(Fact::count("frames_2", replay.frames_2.len()));
            facts.push(Fact::count("events_2", replay.events_2.len()));
        }
        facts.push(Fact::text("time", clock(time as i64)));
        facts.push(Fact::flag("finished", finished));

        Summary {
            file: file_name(path),
            kind: "replay",
            name: replay.level.clone(),
            link: replay.link,
            facts,
        }
    }

    pub fn to_text(&self, template: Option<&str>) -> Result<String, LocatedError> {
        let mut tt = TinyTemplate::new();
        tt.set_default_formatter(&tinytemplate::format_unescaped);
        tt.add_template("summary", template.unwrap_or(DEFAULT_TEMPLATE))
            .map_err(anchor_error())?;
        tt.render("summary", self).map_err(anchor_error())
    }

    pub fn to_json(&self) -> Result<String, LocatedError> {
        let mut object = HashMap::new();
        object.insert("file".to_string(), JsonValue::String(self.file.clone()));
        object.insert("kind".to_string(), JsonValue::String(self.kind.to_string()));
        object.insert("name".to_string(), JsonValue::String(self.name.clone()));
        object.insert("link".to_string(), JsonValue::Number(f64::from(self.link)));
        for fact in &self.facts {
            object.insert(fact.key.to_string(), fact.json.clone());
        }
        JsonValue::Object(object)
            .stringify()
            .map_err(as_io_error)
            .map_err(anchor_error())
    }
}

/// Both best-time tables of a level as text.
pub fn top10_text(level: &Level) -> String {
    let mut out = String::new();
    let tables = [("single", &level.top10_single), ("multi", &level.top10_multi)];
    for (title, entries) in tables.iter() {
        out.push_str(title);
        out.push_str(":\n");
        if entries.is_empty() {
            out.push_str("  (empty)\n");
        }
        for (n, entry) in entries.iter().enumerate() {
            out.push_str(&format!(
                "  {:>2}. {}  {}",
                n + 1,
                clock(i64::from(entry.time)),
                entry.name_1
            ));
            if !entry.name_2.is_empty() {
                out.push_str(&format!(" & {}", entry.name_2));
            }
            out.push('\n');
        }
    }
    out
}

/// Both best-time tables of a level as JSON.
pub fn top10_json(level: &Level) -> Result<String, LocatedError> {
    let table = |entries: &[ListEntry]| {
        JsonValue::Array(
            entries
                .iter()
                .map(|entry| {
                    let mut object = HashMap::new();
                    object.insert("name_1".to_string(), JsonValue::String(entry.name_1.clone()));
                    object.insert("name_2".to_string(), JsonValue::String(entry.name_2.clone()));
                    object.insert("time".to_string(), JsonValue::Number(f64::from(entry.time)));
                    let formatted = JsonValue::String(clock(i64::from(entry.time)));
                    object.insert("clock".to_string(), formatted);
                    JsonValue::Object(object)
                })
                .collect(),
        )
    };

    let mut object = HashMap::new();
    object.insert("single".to_string(), table(level.top10_single.as_slice()));
    object.insert("multi".to_string(), table(level.top10_multi.as_slice()));
    JsonValue::Object(object)
        .stringify()
        .map_err(as_io_error)
        .map_err(anchor_error())
}

/// Format hundredths as `MM:SS,HH`, saturating past an hour.
pub fn clock(hundredths: i64) -> String {
    if hundredths < 0 {
        return String::from("--:--,--");
    }
    let minutes = hundredths / 6_000;
    if minutes >= 60 {
        return String::from("59:59,99");
    }
    let seconds = hundredths / 100 % 60;
    let digits = minutes * 10_000 + seconds * 100 + hundredths % 100;
    // In range, so this can not fail.
    elma::time_format(digits as i32).unwrap_or_else(|_| String::from("--:--,--"))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
