//! Stream message dispatch — parse s-expressions and route to handlers.

use lexpr::Value;
use tracing::{debug, warn};

use crate::hand::{DistanceTest, GestureError, LandmarkPoint};
use crate::state::{ConfigUpdate, HandOutcome, RawHand, SessionState};

/// Parse an s-expression message and dispatch to the appropriate handler.
/// Returns the response s-expression.
pub fn handle_message(state: &mut SessionState, raw: &str) -> String {
    let value = match lexpr::from_str(raw) {
        Ok(v) => v,
        Err(e) => {
            warn!("malformed s-expression: {}", e);
            return error_response(0, &format!("malformed s-expression: {e}"));
        }
    };

    let msg_type = get_keyword(&value, "type");
    let msg_id = get_int(&value, "id").unwrap_or(0);

    match msg_type.as_deref() {
        Some("frame") => handle_frame(state, msg_id, &value),
        Some("classify") => handle_classify(state, msg_id, &value),
        Some("config") => handle_config(state, msg_id, &value),
        Some("status") => handle_status(state, msg_id),
        Some("reset") => handle_reset(state, msg_id),
        Some("ping") => ok_response(msg_id),
        Some(other) => {
            debug!("unknown message type: {}", other);
            error_response(msg_id, &format!("unknown message type: {other}"))
        }
        None => error_response(msg_id, "missing :type"),
    }
}

// ── Handlers ───────────────────────────────────────────────

fn handle_frame(state: &mut SessionState, msg_id: i64, value: &Value) -> String {
    let hands = match get_value(value, "hands") {
        Some(v) => v,
        None => return error_response(msg_id, "missing :hands"),
    };
    let hands = match list_items(hands) {
        Some(items) => items,
        None => return error_response(msg_id, ":hands must be a list"),
    };

    let raw_hands = hands.into_iter().map(parse_hand).collect();
    let outcomes = state.process_frame(raw_hands);

    let results: Vec<String> = outcomes
        .iter()
        .enumerate()
        .map(|(i, outcome)| format_outcome(i, outcome))
        .collect();
    format!(
        "(:type :response :id {} :status :ok :frame {} :hands ({}))",
        msg_id,
        state.frames,
        results.join(" ")
    )
}

fn handle_classify(state: &mut SessionState, msg_id: i64, value: &Value) -> String {
    let result = parse_hand(value).and_then(|raw| state.classify_once(&raw));
    match result {
        Ok((hand, c)) => format!(
            "(:type :response :id {} :status :ok :handedness :{} :gesture :{} :label \"{}\" :fingers {})",
            msg_id,
            hand.as_str(),
            c.label.as_str(),
            c.label.display_name(),
            c.states.to_sexp(),
        ),
        Err(e) => gesture_error_response(msg_id, &e),
    }
}

fn handle_config(state: &mut SessionState, msg_id: i64, value: &Value) -> String {
    let update = match parse_config_update(value) {
        Ok(u) => u,
        Err(reason) => return error_response(msg_id, &reason),
    };
    if !update.is_empty() {
        if let Err(e) = state.apply_config(&update) {
            return gesture_error_response(msg_id, &e);
        }
    }
    format!(
        "(:type :response :id {} :status :ok :config {})",
        msg_id,
        state.config().config_sexp()
    )
}

fn handle_status(state: &mut SessionState, msg_id: i64) -> String {
    format!(
        "(:type :response :id {} :status :ok :session {} :config {})",
        msg_id,
        state.status_sexp(),
        state.config().config_sexp()
    )
}

fn handle_reset(state: &mut SessionState, msg_id: i64) -> String {
    state.reset();
    ok_response(msg_id)
}

// ── Request parsing ────────────────────────────────────────

/// Parse one hand plist: `(:handedness :right :landmarks ((x y [z]) ...))`.
fn parse_hand(value: &Value) -> Result<RawHand, GestureError> {
    let handedness = get_string(value, "handedness").filter(|h| h != "nil");

    let landmarks = get_value(value, "landmarks")
        .ok_or_else(|| GestureError::MalformedInput {
            reason: "missing :landmarks".to_string(),
        })?;
    let items = list_items(landmarks).ok_or_else(|| GestureError::MalformedInput {
        reason: ":landmarks must be a list".to_string(),
    })?;

    let landmarks = items
        .into_iter()
        .enumerate()
        .map(|(i, item)| parse_point(i, item))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(RawHand {
        handedness,
        landmarks,
    })
}

/// Parse a `(x y)` or `(x y z)` coordinate list.
fn parse_point(index: usize, value: &Value) -> Result<LandmarkPoint, GestureError> {
    let malformed = |what: &str| GestureError::MalformedInput {
        reason: format!("landmark {index}: {what}"),
    };

    let coords = list_items(value)
        .ok_or_else(|| malformed("expected a coordinate list"))?
        .into_iter()
        .map(|v| match v {
            Value::Number(n) => n.as_f64().map(|f| f as f32),
            _ => None,
        })
        .collect::<Option<Vec<f32>>>()
        .ok_or_else(|| malformed("coordinates must be numbers"))?;

    match coords.as_slice() {
        [x, y] => Ok(LandmarkPoint::new(*x, *y)),
        [x, y, z] => Ok(LandmarkPoint::with_depth(*x, *y, *z)),
        other => Err(malformed(&format!(
            "expected 2 or 3 coordinates, got {}",
            other.len()
        ))),
    }
}

fn parse_config_update(value: &Value) -> Result<ConfigUpdate, String> {
    let mut update = ConfigUpdate::default();

    if let Some(raw) = get_keyword(value, "thumb-margin") {
        let margin: f32 = raw
            .parse()
            .map_err(|_| format!("invalid :thumb-margin {raw}"))?;
        update.thumb_margin = Some(margin);
    }
    if let Some(raw) = get_keyword(value, "distance-ratio") {
        update.distance_test = Some(if raw == "nil" {
            DistanceTest::Absolute
        } else {
            let min_ratio: f32 = raw
                .parse()
                .map_err(|_| format!("invalid :distance-ratio {raw}"))?;
            DistanceTest::Ratio { min_ratio }
        });
    }
    if let Some(raw) = get_keyword(value, "smoothing-window") {
        let window: usize = raw
            .parse()
            .map_err(|_| format!("invalid :smoothing-window {raw}"))?;
        update.smoothing_window = Some(window);
    }

    Ok(update)
}

// ── Response formatting ────────────────────────────────────

fn format_outcome(index: usize, outcome: &HandOutcome) -> String {
    match outcome {
        Ok(r) => format!(
            "(:index {} :status :ok :handedness :{} :gesture :{} :raw-gesture :{} :label \"{}\" :fingers {})",
            index,
            r.handedness.as_str(),
            r.smoothed.as_str(),
            r.classification.label.as_str(),
            r.smoothed.display_name(),
            r.classification.states.to_sexp(),
        ),
        Err(e) => format!(
            "(:index {} :status :error :error :{} :reason \"{}\")",
            index,
            e.kind(),
            escape_string(&e.to_string())
        ),
    }
}

fn ok_response(id: i64) -> String {
    format!("(:type :response :id {} :status :ok)", id)
}

fn error_response(id: i64, reason: &str) -> String {
    format!(
        "(:type :response :id {} :status :error :reason \"{}\")",
        id,
        escape_string(reason)
    )
}

fn gesture_error_response(id: i64, err: &GestureError) -> String {
    format!(
        "(:type :response :id {} :status :error :error :{} :reason \"{}\")",
        id,
        err.kind(),
        escape_string(&err.to_string())
    )
}

/// Escape a string for embedding in an s-expression string literal.
fn escape_string(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

// ── Plist access ───────────────────────────────────────────

/// Find the value following `:key` in an s-expression plist.
fn get_value<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    let prefixed = format!(":{}", key);
    let mut current = value;
    while let Value::Cons(pair) = current {
        let is_key = match pair.car() {
            Value::Keyword(k) => k.as_ref() == key,
            Value::Symbol(s) => s.as_ref() == prefixed,
            _ => false,
        };
        if is_key {
            // Value is the car of the next cons cell
            return match pair.cdr() {
                Value::Cons(next) => Some(next.car()),
                _ => None,
            };
        }
        current = pair.cdr();
    }
    None
}

/// Extract a scalar value from a plist as a string.
fn get_keyword(value: &Value, key: &str) -> Option<String> {
    let val = get_value(value, key)?;
    Some(match val {
        Value::Keyword(v) => v.to_string(),
        Value::Symbol(v) => {
            let s = v.to_string();
            s.strip_prefix(':').unwrap_or(&s).to_string()
        }
        Value::String(v) => v.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => if *b { "t" } else { "nil" }.to_string(),
        Value::Null | Value::Nil => "nil".to_string(),
        _ => val.to_string(),
    })
}

fn get_int(value: &Value, key: &str) -> Option<i64> {
    get_keyword(value, key).and_then(|s| s.parse().ok())
}

fn get_string(value: &Value, key: &str) -> Option<String> {
    get_keyword(value, key)
}

/// Items of a proper list or vector. `()` is an empty list.
fn list_items(value: &Value) -> Option<Vec<&Value>> {
    match value {
        Value::Null | Value::Nil => Some(Vec::new()),
        Value::Vector(items) => Some(items.iter().collect()),
        Value::Cons(_) => {
            let mut items = Vec::new();
            let mut current = value;
            loop {
                match current {
                    Value::Cons(pair) => {
                        items.push(pair.car());
                        current = pair.cdr();
                    }
                    Value::Null => return Some(items),
                    // Improper list
                    _ => return None,
                }
            }
        }
        _ => None,
    }
}

// ── Tests ──────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hand::fixtures::{hand_points, points_sexp};
    use crate::hand::Handedness;
    use crate::state::SessionConfig;

    fn session() -> SessionState {
        SessionState::new(SessionConfig::default()).unwrap()
    }

    fn hand_sexp(hand: &str, thumb: bool, fingers: [bool; 4]) -> String {
        let handedness = if hand.eq_ignore_ascii_case("left") {
            Handedness::Left
        } else {
            Handedness::Right
        };
        format!(
            "(:handedness \"{}\" :landmarks {})",
            hand,
            points_sexp(&hand_points(handedness, thumb, fingers))
        )
    }

    fn parse(s: &str) -> Value {
        lexpr::from_str(s).unwrap()
    }

    // ── get_keyword ─────────────────────────────────────────

    #[test]
    fn test_get_keyword_from_plist() {
        let v = parse("(:type :frame :id 1)");
        assert_eq!(get_keyword(&v, "type"), Some("frame".to_string()));
        assert_eq!(get_keyword(&v, "id"), Some("1".to_string()));
    }

    #[test]
    fn test_get_keyword_string_value() {
        let v = parse("(:handedness \"Right\")");
        assert_eq!(get_string(&v, "handedness"), Some("Right".to_string()));
    }

    #[test]
    fn test_get_keyword_missing_key() {
        let v = parse("(:type :ping)");
        assert_eq!(get_keyword(&v, "nonexistent"), None);
    }

    #[test]
    fn test_get_keyword_empty_list() {
        let v = parse("()");
        assert_eq!(get_keyword(&v, "type"), None);
    }

    #[test]
    fn test_get_int() {
        assert_eq!(get_int(&parse("(:id 42)"), "id"), Some(42));
        assert_eq!(get_int(&parse("(:id -3)"), "id"), Some(-3));
        assert_eq!(get_int(&parse("(:id :frame)"), "id"), None);
    }

    // ── list parsing ────────────────────────────────────────

    #[test]
    fn test_list_items() {
        assert_eq!(list_items(&parse("(1 2 3)")).map(|v| v.len()), Some(3));
        assert_eq!(list_items(&parse("()")).map(|v| v.len()), Some(0));
        assert!(list_items(&parse("(1 . 2)")).is_none());
        assert!(list_items(&parse("7")).is_none());
    }

    #[test]
    fn test_parse_point_2d_and_3d() {
        let p = parse_point(0, &parse("(0.25 0.5)")).unwrap();
        assert_eq!(p, LandmarkPoint::new(0.25, 0.5));
        let p = parse_point(0, &parse("(0.25 0.5 -0.125)")).unwrap();
        assert_eq!(p, LandmarkPoint::with_depth(0.25, 0.5, -0.125));
    }

    #[test]
    fn test_parse_point_missing_coordinate() {
        let err = parse_point(7, &parse("(0.25)")).unwrap_err();
        assert!(matches!(err, GestureError::MalformedInput { .. }));
        assert!(err.to_string().contains("landmark 7"));
    }

    #[test]
    fn test_parse_point_non_numeric() {
        assert!(parse_point(0, &parse("(0.25 :up)")).is_err());
        assert!(parse_point(0, &parse("0.25")).is_err());
    }

    #[test]
    fn test_parse_hand_missing_landmarks() {
        let err = parse_hand(&parse("(:handedness :left)")).unwrap_err();
        assert!(err.to_string().contains("missing :landmarks"));
    }

    #[test]
    fn test_parse_hand_nil_handedness() {
        let v = parse(&format!(
            "(:handedness nil :landmarks {})",
            points_sexp(&hand_points(Handedness::Right, false, [false; 4]))
        ));
        let hand = parse_hand(&v).unwrap();
        assert_eq!(hand.handedness, None);
        assert_eq!(hand.landmarks.len(), 21);
    }

    // ── handlers ────────────────────────────────────────────

    #[test]
    fn test_ping() {
        let mut state = session();
        let r = handle_message(&mut state, "(:type :ping :id 9)");
        assert_eq!(r, "(:type :response :id 9 :status :ok)");
    }

    #[test]
    fn test_malformed_sexp() {
        let mut state = session();
        let r = handle_message(&mut state, "(:type :frame");
        let v = parse(&r);
        assert_eq!(get_keyword(&v, "status"), Some("error".to_string()));
        assert_eq!(get_int(&v, "id"), Some(0));
    }

    #[test]
    fn test_unknown_type() {
        let mut state = session();
        let r = handle_message(&mut state, "(:type :wave :id 2)");
        assert!(r.contains("unknown message type: wave"));
    }

    #[test]
    fn test_missing_type() {
        let mut state = session();
        let r = handle_message(&mut state, "(:id 2)");
        assert!(r.contains("missing :type"));
    }

    #[test]
    fn test_frame_peace_sign() {
        let mut state = session();
        let msg = format!(
            "(:type :frame :id 5 :hands ({}))",
            hand_sexp("Right", false, [true, true, false, false])
        );
        let r = handle_message(&mut state, &msg);
        let v = parse(&r);
        assert_eq!(get_keyword(&v, "status"), Some("ok".to_string()));
        assert_eq!(get_int(&v, "frame"), Some(1));
        assert!(r.contains(":gesture :peace-sign"));
        assert!(r.contains(":label \"Peace\""));
        assert!(r.contains(":fingers (:thumb nil :index t :middle t :ring nil :pinky nil)"));
    }

    #[test]
    fn test_frame_mixed_hands() {
        let mut state = session();
        let short: Vec<_> = hand_points(Handedness::Left, false, [false; 4])
            .into_iter()
            .take(19)
            .collect();
        let msg = format!(
            "(:type :frame :id 6 :hands ((:handedness :left :landmarks {}) {}))",
            points_sexp(&short),
            hand_sexp("Right", true, [false; 4])
        );
        let r = handle_message(&mut state, &msg);
        assert!(r.contains("(:index 0 :status :error :error :malformed-input"));
        assert!(r.contains("(:index 1 :status :ok :handedness :right :gesture :thumbs-up"));
        assert!(lexpr::from_str(&r).is_ok());
    }

    #[test]
    fn test_frame_missing_hands() {
        let mut state = session();
        let r = handle_message(&mut state, "(:type :frame :id 3)");
        assert!(r.contains("missing :hands"));
        assert_eq!(state.frames, 0);
    }

    #[test]
    fn test_frame_no_hands() {
        let mut state = session();
        let r = handle_message(&mut state, "(:type :frame :id 3 :hands ())");
        assert_eq!(r, "(:type :response :id 3 :status :ok :frame 1 :hands ())");
    }

    #[test]
    fn test_classify_missing_handedness() {
        let mut state = session();
        let msg = format!(
            "(:type :classify :id 4 :landmarks {})",
            points_sexp(&hand_points(Handedness::Right, false, [false; 4]))
        );
        let r = handle_message(&mut state, &msg);
        assert!(r.contains(":error :missing-handedness"));
    }

    #[test]
    fn test_classify_fist() {
        let mut state = session();
        let msg = format!(
            "(:type :classify :id 4 :handedness :left :landmarks {})",
            points_sexp(&hand_points(Handedness::Left, false, [false; 4]))
        );
        let r = handle_message(&mut state, &msg);
        assert!(r.contains(":handedness :left :gesture :fist :label \"Fist\""));
        assert_eq!(state.frames, 0);
    }

    #[test]
    fn test_config_update() {
        let mut state = session();
        let r = handle_message(
            &mut state,
            "(:type :config :id 8 :thumb-margin 0.1 :distance-ratio 1.5 :smoothing-window 3)",
        );
        assert!(r.contains(":status :ok"));
        assert!(r.contains(":thumb-margin 0.100"));
        assert!(r.contains(":distance-ratio 1.500"));
        assert!(r.contains(":smoothing-window 3"));
        assert_eq!(state.config().smoothing_window, 3);

        let r = handle_message(&mut state, "(:type :config :id 9 :distance-ratio nil)");
        assert!(r.contains(":distance-ratio nil"));
    }

    #[test]
    fn test_config_rejects_bad_values() {
        let mut state = session();
        let r = handle_message(&mut state, "(:type :config :id 8 :thumb-margin :wide)");
        assert!(r.contains("invalid :thumb-margin"));

        let r = handle_message(
            &mut state,
            "(:type :config :id 9 :thumb-margin 0.2 :smoothing-window 0)",
        );
        assert!(r.contains(":error :invalid-config"));
        assert_eq!(state.config(), &SessionConfig::default());
    }

    #[test]
    fn test_status_and_reset() {
        let mut state = session();
        let msg = format!(
            "(:type :frame :id 1 :hands ({}))",
            hand_sexp("Left", true, [true; 4])
        );
        handle_message(&mut state, &msg);
        let r = handle_message(&mut state, "(:type :status :id 2)");
        assert!(r.contains(":frames 1"));
        assert!(r.contains(":open-palm 1"));

        handle_message(&mut state, "(:type :reset :id 3)");
        let r = handle_message(&mut state, "(:type :status :id 4)");
        assert!(r.contains(":frames 0"));
    }

    // ── Protocol round-trip ─────────────────────────────────

    #[test]
    fn test_error_response_is_valid_sexp() {
        let r = error_response(5, "bad \"quote\"");
        let v = parse(&r);
        assert_eq!(get_keyword(&v, "reason"), Some("bad \"quote\"".to_string()));
    }

    #[test]
    fn test_escape_string() {
        assert_eq!(escape_string("plain"), "plain");
        assert_eq!(escape_string("a\\b"), "a\\\\b");
        assert_eq!(escape_string("say \"hi\""), "say \\\"hi\\\"");
    }
}
