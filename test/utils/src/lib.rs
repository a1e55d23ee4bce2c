/// A complete tutor reply as the model streams it, minus whitespace between
/// tokens.
pub fn tutor_response_fixture() -> &'static str {
    return r#"{"chatMessage":"Great effort! Just one small slip.","englishSentence":"I have a dog.","submittedSentence":"Ich habe ein Hund.","correctedResponse":"Ich habe einen Hund.","explanations":["\"Hund\" is masculine, so the accusative article is \"einen\"."],"nextExercise":{"fullSentence":"I like the red car","parts":[{"text":"red car","translation":"das rote Auto","notes":"Adjectives take an -e ending after the definite article."},{"text":"I like","translation":"Ich mag","notes":"mögen is irregular."}]},"progress":{"overallLevel":"A2","stepsToNextLevel":3,"categoryLevels":{"grammar":"A2","vocabulary":"B1"}}}"#;
}

/// Splits `input` into chunks of at most `size` characters, never cutting a
/// multi-byte character in half.
pub fn chunked(input: &str, size: usize) -> Vec<String> {
    let chars = input.chars().collect::<Vec<char>>();
    return chars
        .chunks(size.max(1))
        .map(|chunk| {
            return chunk.iter().collect::<String>();
        })
        .collect();
}

/// Server-sent event body in the shape of the Anthropic Messages API when a
/// tool call is forced, splitting `json` into `chunk_size` deltas.
pub fn claude_sse_fixture(json: &str, chunk_size: usize) -> String {
    let mut lines = vec![
        "event: message_start".to_string(),
        r#"data: {"type":"message_start","message":{"id":"msg_1","role":"assistant"}}"#.to_string(),
        "".to_string(),
        "event: content_block_start".to_string(),
        r#"data: {"type":"content_block_start","index":0,"content_block":{"type":"tool_use","id":"toolu_1","name":"json","input":{}}}"#.to_string(),
        "".to_string(),
    ];

    for chunk in chunked(json, chunk_size) {
        let delta = format!(
            r#"{{"type":"content_block_delta","index":0,"delta":{{"type":"input_json_delta","partial_json":{}}}}}"#,
            escape_json_string(&chunk)
        );
        lines.push("event: content_block_delta".to_string());
        lines.push(format!("data: {delta}"));
        lines.push("".to_string());
    }

    lines.push("event: content_block_stop".to_string());
    lines.push(r#"data: {"type":"content_block_stop","index":0}"#.to_string());
    lines.push("".to_string());
    lines.push("event: message_stop".to_string());
    lines.push(r#"data: {"type":"message_stop"}"#.to_string());

    return lines.join("\n");
}

/// Server-sent event body in the shape of the OpenAI chat completions API.
pub fn openai_sse_fixture(json: &str, chunk_size: usize) -> String {
    let mut lines = vec![];
    for chunk in chunked(json, chunk_size) {
        lines.push(format!(
            r#"data: {{"choices":[{{"index":0,"delta":{{"content":{}}}}}]}}"#,
            escape_json_string(&chunk)
        ));
        lines.push("".to_string());
    }
    lines.push("data: [DONE]".to_string());

    return lines.join("\n");
}

fn escape_json_string(input: &str) -> String {
    let mut res = String::from("\"");
    for char in input.chars() {
        match char {
            '"' => res.push_str("\\\""),
            '\\' => res.push_str("\\\\"),
            '\n' => res.push_str("\\n"),
            _ => res.push(char),
        }
    }
    res.push('"');

    return res;
}
