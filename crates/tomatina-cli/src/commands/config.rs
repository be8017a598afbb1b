use clap::Subcommand;
use tomatina_core::{FileStore, Settings, SettingsPatch, StorageGateway};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the full configuration
    Show,
    /// Get a single value by key (e.g. focusTime)
    Get { key: String },
    /// Set a value by key; out-of-range numbers are clamped
    Set { key: String, value: String },
}

fn get_json_value_by_path<'a>(
    root: &'a serde_json::Value,
    key: &str,
) -> Option<&'a serde_json::Value> {
    if key.is_empty() {
        return None;
    }
    let mut current = root;
    for part in key.split('.') {
        current = current.get(part)?;
    }
    Some(current)
}

fn set_json_value_by_path(
    root: &mut serde_json::Value,
    key: &str,
    value: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut parts = key.split('.').peekable();
    if parts.peek().is_none() {
        return Err("config key is empty".into());
    }

    let mut current = root;
    while let Some(part) = parts.next() {
        let is_leaf = parts.peek().is_none();
        if is_leaf {
            let obj = current
                .as_object_mut()
                .ok_or_else(|| format!("unknown config key: {key}"))?;
            let existing = obj
                .get(part)
                .ok_or_else(|| format!("unknown config key: {key}"))?;

            let new_value = match existing {
                serde_json::Value::Bool(_) => serde_json::Value::Bool(value.parse::<bool>()?),
                serde_json::Value::Number(_) => {
                    let n = value
                        .parse::<u64>()
                        .map_err(|_| format!("cannot parse '{value}' as number"))?;
                    serde_json::Value::Number(n.into())
                }
                _ => serde_json::Value::String(value.into()),
            };

            obj.insert(part.to_string(), new_value);
            return Ok(());
        }

        current = current
            .get_mut(part)
            .ok_or_else(|| format!("unknown config key: {key}"))?;
    }

    Err(format!("unknown config key: {key}").into())
}

/// Re-clamp all numeric fields after a raw JSON edit.
fn clamp_in_place(settings: &mut Settings) {
    let patch = SettingsPatch {
        focus_time: Some(settings.focus_time),
        short_break_time: Some(settings.short_break_time),
        long_break_time: Some(settings.long_break_time),
        sessions_before_long_break: Some(settings.sessions_before_long_break),
        ..SettingsPatch::default()
    };
    for issue in settings.apply(&patch) {
        eprintln!("warning: {issue}");
    }
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    let store = FileStore::open()?;
    let settings = store.load_settings()?;

    match action {
        ConfigAction::Show => {
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
        ConfigAction::Get { key } => {
            let json = serde_json::to_value(&settings)?;
            match get_json_value_by_path(&json, &key) {
                Some(serde_json::Value::String(s)) => println!("{s}"),
                Some(other) => println!("{other}"),
                None => return Err(format!("unknown config key: {key}").into()),
            }
        }
        ConfigAction::Set { key, value } => {
            let mut json = serde_json::to_value(&settings)?;
            set_json_value_by_path(&mut json, &key, &value)?;
            let mut updated: Settings = serde_json::from_value(json)?;
            clamp_in_place(&mut updated);
            store.save_settings(&updated)?;
            println!("{}", serde_json::to_string_pretty(&updated)?);
        }
    }
    Ok(())
}
