use serde_json::Value;

/// snake_case → camelCase. Keys already in camelCase are left alone.
pub fn camelize_key(key: &str) -> String {
    let mut result = String::with_capacity(key.len());
    for segment in key.split('_').filter(|s| !s.is_empty()) {
        let mut chars = segment.chars();
        if let Some(first) = chars.next() {
            if result.is_empty() {
                result.extend(first.to_lowercase());
            } else {
                result.extend(first.to_uppercase());
            }
            result.push_str(chars.as_str());
        }
    }
    if result.is_empty() {
        key.to_string()
    } else {
        result
    }
}

/// Recursively camelizes every object key. Array elements are only touched
/// through the objects nested inside them.
pub fn camelize(value: Value) -> Value {
    convert_keys(value, &camelize_key)
}

/// Upstream payloads arrive with upper-case keys (`TERM_ID`); lower-case them
/// before camelizing.
pub fn downcase_and_camelize(value: Value) -> Value {
    convert_keys(value, &|key: &str| camelize_key(&key.to_lowercase()))
}

fn convert_keys(value: Value, convert: &dyn Fn(&str) -> String) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, nested)| (convert(&key), convert_keys(nested, convert)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| convert_keys(item, convert))
                .collect(),
        ),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_camelize_key() {
        assert_eq!(camelize_key("enrollment_term"), "enrollmentTerm");
        assert_eq!(camelize_key("uc_add_class_enrollment"), "ucAddClassEnrollment");
        assert_eq!(camelize_key("termId"), "termId");
        assert_eq!(camelize_key("has_holds"), "hasHolds");
        assert_eq!(camelize_key("2168"), "2168");
        assert_eq!(camelize_key("_"), "_");
    }

    #[test]
    fn test_camelize_nested_structures() {
        let input = json!({
            "enrollment_term_instruction_types": [
                {"career_code": "UGRD", "academic_plans": [{"plan_code": "x"}], "term": {"termId": "2168"}}
            ],
            "links": {"uc_view_class_enrollment": "https://cs.example.edu/view"},
            "has_holds": false,
            "tags": ["snake_value", 3]
        });

        let output = camelize(input);

        assert_eq!(output["enrollmentTermInstructionTypes"][0]["careerCode"], "UGRD");
        assert_eq!(
            output["enrollmentTermInstructionTypes"][0]["academicPlans"][0]["planCode"],
            "x"
        );
        assert_eq!(output["enrollmentTermInstructionTypes"][0]["term"]["termId"], "2168");
        assert_eq!(
            output["links"]["ucViewClassEnrollment"],
            "https://cs.example.edu/view"
        );
        // strings inside arrays are values, not keys
        assert_eq!(output["tags"], json!(["snake_value", 3]));
    }

    #[test]
    fn test_camelize_is_idempotent() {
        let input = json!({
            "outer_key": {"innerKey": [{"deep_key": 1}], "already_ok": true},
            "mixedCase_key": null
        });

        let once = camelize(input);
        let twice = camelize(once.clone());

        assert_eq!(once, twice);
        assert_eq!(once["outerKey"]["innerKey"][0]["deepKey"], 1);
        assert!(once.get("mixedCaseKey").is_some());
    }

    #[test]
    fn test_downcase_and_camelize_upstream_keys() {
        let input = json!({
            "UC_SR_CURR_TERMS": {
                "ENROLLMENT_TERMS": [
                    {"TERM_ID": "2168", "TERM_DESCR": "2016 Fall", "ACAD_CAREER": "UGRD"}
                ]
            }
        });

        let output = downcase_and_camelize(input);

        let term = &output["ucSrCurrTerms"]["enrollmentTerms"][0];
        assert_eq!(term["termId"], "2168");
        assert_eq!(term["termDescr"], "2016 Fall");
        assert_eq!(term["acadCareer"], "UGRD");
    }

    #[test]
    fn test_scalars_pass_through() {
        assert_eq!(camelize(json!("some_string")), json!("some_string"));
        assert_eq!(camelize(json!(42)), json!(42));
        assert_eq!(camelize(Value::Null), Value::Null);
    }
}
