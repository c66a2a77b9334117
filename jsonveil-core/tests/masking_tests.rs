// jsonveil-core/tests/masking_tests.rs
use anyhow::Result;
use serde_json::{json, Value};
use test_log::test; // Routes `log` output through `env_logger` in tests.
use uuid::Uuid;

use jsonveil_core::{
    ArrayBuilder, CommentHandling, Emit, JsonObserver, JsonVeilError, MaskStrategy, ObjectBuilder,
    PropMatch, RelativeBuilder, Scalar, TransformOptions, ValuePolicy, NUMBER_PLACEHOLDER,
    STRING_PLACEHOLDER,
};

/// Sensitive values planted in the request fixture. None of them may survive
/// masking.
struct Sensitive {
    card_id: String,
    user_entered: String,
    template_id: String,
    account_number: String,
    card_number: String,
    card_holder: String,
    order_description: String,
    customer_id: String,
    customer_birth: String,
    ip: String,
    email: String,
    phone: String,
    document: String,
    first_name: String,
    last_name: String,
    address: String,
}

impl Sensitive {
    fn new() -> Self {
        Self {
            card_id: Uuid::new_v4().to_string(),
            user_entered: "quietly forgotten words".to_string(),
            template_id: Uuid::new_v4().to_string(),
            account_number: "40817810099910004312".to_string(),
            card_number: "4111111111111111".to_string(),
            card_holder: "MARGUERITE OKONKWO".to_string(),
            order_description: "Two tickets for the evening show".to_string(),
            customer_id: Uuid::new_v4().to_string(),
            customer_birth: "03/14/2006 00:00:00".to_string(),
            ip: "192.168.14.237".to_string(),
            email: "marguerite.okonkwo@example.org".to_string(),
            phone: "+1-555-0100-2287".to_string(),
            document: "7345012986".to_string(),
            first_name: "Marguerite".to_string(),
            last_name: "Okonkwo".to_string(),
            address: "Valparaiso".to_string(),
        }
    }

    fn all(&self) -> Vec<&str> {
        vec![
            self.card_id.as_str(),
            self.user_entered.as_str(),
            self.template_id.as_str(),
            self.account_number.as_str(),
            self.card_number.as_str(),
            self.card_holder.as_str(),
            self.order_description.as_str(),
            self.customer_id.as_str(),
            self.customer_birth.as_str(),
            self.ip.as_str(),
            self.email.as_str(),
            self.phone.as_str(),
            self.document.as_str(),
            self.first_name.as_str(),
            self.last_name.as_str(),
            self.address.as_str(),
        ]
    }

    fn request_json(&self) -> String {
        format!(
            r#"{{
  // Comment
  "routing": {{
    "method": "test",
    "contractId": 2
  }},
  "session": {{
    "id": "1",
    "method": "test",
    "accountNumber": "{account}",
    "merchant": {{
      "id": "213",
      "terminal": {{
        "contractId": 285,
        "businessActivityType": null
      }}
    }},
    "recurringTemplate": {{
      "id": "{template}"
    }},
    "user": {{
      "entered": "{entered}"
    }},
    "card": {{
      "saved": {{
        "id": "{card_id}"
      }},
      "number": "{card_number}",
      "cardHolder": "{holder}"
    }},
    "browser": {{
      "ipAddress": "{ip}",
      "userAgent": null
    }},
    "customer": {{
      "id": "{customer_id}",
      "email": "{email}",
      "phone": "{phone}",
      "firstName": "{first}",
      "lastName": "{last}",
      "address": "{address}",
      "documentNumber": "{document}",
      "birthDate": "{birth}"
    }},
    "order": {{
      "id": "333",
      "currency": "RSD",
      "amount": 10000,
      "description": "{description}"
    }}
  }}
}}"#,
            account = self.account_number,
            template = self.template_id,
            entered = self.user_entered,
            card_id = self.card_id,
            card_number = self.card_number,
            holder = self.card_holder,
            ip = self.ip,
            customer_id = self.customer_id,
            email = self.email,
            phone = self.phone,
            first = self.first_name,
            last = self.last_name,
            address = self.address,
            document = self.document,
            birth = self.customer_birth,
            description = self.order_description,
        )
    }
}

fn pattern(regex: &str, replacement: &str) -> MaskStrategy<()> {
    MaskStrategy::pattern(regex, replacement).expect("masking pattern must compile")
}

fn request_masking(fallback: ValuePolicy<()>) -> Result<JsonObserver> {
    let relative = RelativeBuilder::<()>::new()
        .property([PropMatch::ends_with("card"), "saved".into(), "id".into()]).mask_str(pattern(r"^(.{6}).*(.{6})$", "$1***$2"))
        .property(["card", "number"]).mask_str(pattern(r"^(\d{6})\d+(\d{4})$", "$1******$2"))
        .property(["user", "entered"]).mask_str_with(|_, _| Some(String::new()))
        .property(["recurringTemplate", "id"]).mask_str(pattern(r"^(.{2}).*(.)$", "$1***$2"))
        .property(PropMatch::contains("cardHolder")).mask_str(pattern(r"(\w)\w*", "$1*"))
        .property([PropMatch::starts_with("order"), "description".into()]).mask_str(pattern(r"^(.{2}).*(.{2})$", "$1***$2"))
        .property([PropMatch::starts_with("customer"), "id".into()]).mask_str(pattern(r"^(.{6}).*(.{6})$", "$1***$2"))
        .property([PropMatch::starts_with("customer"), "birthDate".into()]).mask_str(pattern(r"^(.{2}).*(.)$", "$1***$2"))
        .property(PropMatch::contains("ipAddress")).mask_str(pattern(r"\d+$", "*"))
        .property(PropMatch::contains("email")).mask_str(pattern(r"^(.)[^@]*@.*(\.[^.]+)$", "$1***@***$2"))
        .property(PropMatch::contains("phone")).mask_str(pattern(r"^.*(.{2})$", "***$1"))
        .property(PropMatch::contains("documentNumber")).mask_str(pattern(r"^(.{2}).*(.{2})$", "$1***$2"))
        .property(PropMatch::contains("firstName")).mask_str(pattern(r"^(.).*$", "$1***"))
        .property(PropMatch::contains("lastName")).mask_str(pattern(r"^(.).*$", "$1***"))
        .property(PropMatch::contains("address")).mask_str(pattern(r"(?s).+", "***"))
        .property(PropMatch::contains("accountNumber")).mask_str(pattern(r"^.*(.{4})$", "***$1"))
        .fallback(fallback)
        .build()?;
    Ok(JsonObserver::object(ObjectBuilder::<()>::new().build()?).with_default_policy(relative))
}

fn jsonc_options() -> TransformOptions {
    TransformOptions::default()
        .comment_handling(CommentHandling::Allow)
        .indented(true)
}

fn mask(observer: &JsonObserver, input: &str) -> Result<String> {
    Ok(observer
        .mask(Some(input), &TransformOptions::default())?
        .expect("input was given"))
}

fn mask_value(observer: &JsonObserver, input: &str) -> Result<Value> {
    Ok(serde_json::from_str(&mask(observer, input)?)?)
}

#[test]
fn test_mask_request_hides_every_sensitive_value() -> Result<()> {
    let sensitive = Sensitive::new();
    let observer = request_masking(ValuePolicy::BlockList)?;

    let masked = observer
        .mask(Some(&sensitive.request_json()), &jsonc_options())?
        .expect("input was given");

    assert!(!masked.is_empty());
    for value in sensitive.all() {
        assert!(!masked.contains(value), "{} leaked into:\n{}", value, masked);
    }
    assert!(masked.contains("/* Comment*/"));
    assert!(masked.contains(r#""amount": 10000"#));
    assert!(masked.contains(r#""number": "411111******1111""#));
    assert!(masked.contains(r#""ipAddress": "192.168.14.*""#));
    assert!(masked.contains(r#""email": "m***@***.org""#));
    assert!(masked.contains(r#""entered": """#));
    Ok(())
}

#[test]
fn test_repeated_masking_is_idempotent() -> Result<()> {
    let sensitive = Sensitive::new();
    let observer = request_masking(ValuePolicy::BlockList)?;
    let input = sensitive.request_json();

    let first = observer.mask(Some(&input), &jsonc_options())?;
    let second = observer.mask(Some(&input), &jsonc_options())?;
    assert_eq!(first, second);
    Ok(())
}

#[test]
fn test_allow_list_default_redacts_strings_and_numbers() -> Result<()> {
    let observer = JsonObserver::object(ObjectBuilder::<()>::new().build()?);
    let masked = mask(&observer, r#"{"a":"secret","b":5,"c":true,"d":null}"#)?;
    assert_eq!(
        masked,
        format!(
            r#"{{"a":"{}","b":"{}","c":true,"d":null}}"#,
            STRING_PLACEHOLDER, NUMBER_PLACEHOLDER
        )
    );
    Ok(())
}

#[test]
fn test_absolute_rules_are_scoped_to_their_path() -> Result<()> {
    let observer = JsonObserver::object(
        ObjectBuilder::<()>::new()
            .property("routing").object(|o| o.property("method").unmasked())
            .build()?,
    );
    let masked = mask_value(&observer, r#"{"routing":{"method":"card"},"session":{"method":"card"}}"#)?;
    assert_eq!(
        masked,
        json!({"routing": {"method": "card"}, "session": {"method": STRING_PLACEHOLDER}})
    );
    Ok(())
}

#[test]
fn test_relative_rules_ignore_depth() -> Result<()> {
    let relative = RelativeBuilder::<()>::new()
        .property("email").mask_str("***")
        .fallback(ValuePolicy::BlockList)
        .build()?;
    let observer = JsonObserver::any(ObjectBuilder::<()>::new().build()?, ArrayBuilder::<()>::new().build()?)
        .with_default_policy(relative);

    let masked = mask_value(
        &observer,
        r#"{"email":"a@x","x":{"y":[{"EMAIL":"b@x"}]},"emails":"c@x"}"#,
    )?;
    assert_eq!(
        masked,
        json!({"email": "***", "x": {"y": [{"EMAIL": "***"}]}, "emails": "c@x"})
    );

    let masked = mask_value(&observer, r#"[[{"email":"deep@x","n":1}]]"#)?;
    assert_eq!(masked, json!([[{"email": "***", "n": 1}]]));
    Ok(())
}

#[test]
fn test_first_declared_relative_rule_wins() -> Result<()> {
    let relative = RelativeBuilder::<()>::new()
        .property(PropMatch::contains("ipAddress")).mask_str("ip")
        .property(PropMatch::contains("address")).mask_str("addr")
        .fallback(ValuePolicy::BlockList)
        .build()?;
    let observer = JsonObserver::object(ObjectBuilder::<()>::new().build()?).with_default_policy(relative);
    let masked = mask_value(&observer, r#"{"ipAddress":"1.2.3.4","homeAddress":"x"}"#)?;
    assert_eq!(masked, json!({"ipAddress": "ip", "homeAddress": "addr"}));
    Ok(())
}

#[test]
fn test_leaf_type_mismatch_falls_back_to_policy() -> Result<()> {
    let observer = JsonObserver::object(
        ObjectBuilder::<()>::new()
            .property("amount").mask_int(|v, _| v.map(|n| (n * 2).to_string()))
            .build()?,
    );

    assert_eq!(mask_value(&observer, r#"{"amount":21}"#)?, json!({"amount": "42"}));
    assert_eq!(mask_value(&observer, r#"{"amount":null}"#)?, json!({"amount": null}));
    assert_eq!(
        mask_value(&observer, r#"{"amount":"21"}"#)?,
        json!({"amount": STRING_PLACEHOLDER})
    );
    // Decodes as a number but not as a 32-bit integer.
    assert_eq!(
        mask_value(&observer, r#"{"amount":1.5}"#)?,
        json!({"amount": NUMBER_PLACEHOLDER})
    );
    assert_eq!(
        mask_value(&observer, r#"{"amount":{"value":5,"ok":true,"list":["x"]}}"#)?,
        json!({"amount": {"value": NUMBER_PLACEHOLDER, "ok": true, "list": [STRING_PLACEHOLDER]}})
    );
    Ok(())
}

#[test]
fn test_block_list_round_trip_preserves_text() -> Result<()> {
    let observer = JsonObserver::object(ObjectBuilder::<()>::new().build()?)
        .with_default_policy(ValuePolicy::BlockList);
    let input = r#"{"z":1.0,"a":[1e5,-0,12345678901234567890],"m":"é\n","t":false}"#;
    let masked = mask(&observer, input)?;
    assert_eq!(
        masked,
        "{\"z\":1.0,\"a\":[1e5,-0,12345678901234567890],\"m\":\"\u{e9}\\n\",\"t\":false}"
    );
    Ok(())
}

#[test]
fn test_null_list_applied_directly_nulls_booleans() -> Result<()> {
    let observer = JsonObserver::object(
        ObjectBuilder::<()>::new()
            .property("flag").mask_value(ValuePolicy::NullList)
            .build()?,
    )
    .with_default_policy(ValuePolicy::NullList);

    let masked = mask_value(&observer, r#"{"flag":true,"other":true,"s":"x"}"#)?;
    assert_eq!(masked, json!({"flag": null, "other": true, "s": null}));
    Ok(())
}

#[test]
fn test_scope_policy_overrides_the_subtree_only() -> Result<()> {
    let observer = JsonObserver::object(
        ObjectBuilder::<()>::new()
            .property("public").object(|o| {
                o.with_policy(ValuePolicy::BlockList)
                    .property("token").mask_str("***")
            })
            .build()?,
    );
    let masked = mask_value(
        &observer,
        r#"{"public":{"a":"x","n":{"b":2},"token":"t"},"private":"y"}"#,
    )?;
    assert_eq!(
        masked,
        json!({"public": {"a": "x", "n": {"b": 2}, "token": "***"}, "private": STRING_PLACEHOLDER})
    );
    Ok(())
}

#[test]
fn test_policy_rule_on_container_covers_whole_subtree() -> Result<()> {
    let observer = JsonObserver::object(
        ObjectBuilder::<()>::new()
            .property("meta").unmasked()
            .property("secret").mask_value(ValuePolicy::NullList)
            .build()?,
    );
    let masked = mask_value(
        &observer,
        r#"{"meta":{"v":[1,"a"]},"secret":{"k":"v","b":false},"x":1}"#,
    )?;
    assert_eq!(
        masked,
        json!({"meta": {"v": [1, "a"]}, "secret": {"k": null, "b": false}, "x": NUMBER_PLACEHOLDER})
    );
    Ok(())
}

#[test]
fn test_array_rules_claim_elements_by_shape() -> Result<()> {
    let observer = JsonObserver::object(
        ObjectBuilder::<()>::new()
            .property("items").array(|a| {
                a.objects(|o| o.property("sku").unmasked())
                    .element().mask_str("scalar")
            })
            .build()?,
    );
    let masked = mask_value(
        &observer,
        r#"{"items":[{"sku":"A-1","price":3},"loose",[{"sku":"nested"}]]}"#,
    )?;
    assert_eq!(
        masked,
        json!({"items": [
            {"sku": "A-1", "price": NUMBER_PLACEHOLDER},
            "scalar",
            [{"sku": STRING_PLACEHOLDER}]
        ]})
    );
    Ok(())
}

#[test]
fn test_any_root_accepts_objects_arrays_and_null() -> Result<()> {
    let observer = JsonObserver::any(
        ObjectBuilder::<()>::new().property("a").unmasked().build()?,
        ArrayBuilder::<()>::new().element().unmasked().build()?,
    );
    assert_eq!(
        mask_value(&observer, r#"{"a":"x","b":"y"}"#)?,
        json!({"a": "x", "b": STRING_PLACEHOLDER})
    );
    assert_eq!(
        mask_value(&observer, r#"["x",{"k":"v"}]"#)?,
        json!(["x", {"k": STRING_PLACEHOLDER}])
    );
    assert_eq!(mask(&observer, "null")?, "null");
    Ok(())
}

#[test]
fn test_root_shape_mismatch_is_wrong_path() -> Result<()> {
    let observer = JsonObserver::array(ArrayBuilder::<()>::new().build()?);
    let err = observer
        .mask(Some(r#"{"a":1}"#), &TransformOptions::default())
        .unwrap_err();
    assert!(matches!(err, JsonVeilError::WrongPath { .. }));
    assert!(err.to_string().starts_with("Wrong path"));
    Ok(())
}

#[test]
fn test_malformed_input_is_a_parse_error() -> Result<()> {
    let observer = JsonObserver::object(ObjectBuilder::<()>::new().build()?);
    for input in [r#"{"a":}"#, r#"{"a":1"#, r#"{"a" 1}"#, "", "{} x"] {
        let err = observer
            .mask(Some(input), &TransformOptions::default())
            .unwrap_err();
        assert!(matches!(err, JsonVeilError::Parse(_)), "{:?} gave {}", input, err);
    }
    Ok(())
}

#[test]
fn test_pattern_rules_match_names_case_insensitively() -> Result<()> {
    let observer = JsonObserver::object(
        ObjectBuilder::<()>::new()
            .pattern("^x-(trace|span)-id$").unmasked()
            .build()?,
    );
    let masked = mask_value(&observer, r#"{"X-Trace-Id":"t","x-span-id":"s","x-user":"u"}"#)?;
    assert_eq!(
        masked,
        json!({"X-Trace-Id": "t", "x-span-id": "s", "x-user": STRING_PLACEHOLDER})
    );
    Ok(())
}

#[test]
fn test_custom_policy_sees_every_scalar_with_its_path() -> Result<()> {
    let policy = ValuePolicy::custom(|scalar, seen: &mut Vec<String>, path| {
        seen.push(path.to_string());
        Ok(match scalar {
            Scalar::Number(text) => Emit::Int(text.len() as i64),
            Scalar::Str(_) => Emit::Keep,
            Scalar::Bool(b) => Emit::Bool(!b),
            Scalar::Null => Emit::Str("nil".to_string()),
        })
    });
    let observer = JsonObserver::object(ObjectBuilder::new().build()?).with_default_policy(policy);

    let mut seen = Vec::new();
    let out = observer
        .transform(
            Some(r#"{"n":12345,"a":[true,null],"s":"x"}"#),
            &mut seen,
            &TransformOptions::default(),
        )?
        .expect("input was given");
    assert_eq!(out, r#"{"n":5,"a":[false,"nil"],"s":"x"}"#);
    assert_eq!(seen, vec!["n", "a[]", "a[]", "s"]);
    Ok(())
}

#[test]
fn test_custom_policy_errors_stop_the_transform() -> Result<()> {
    let policy = ValuePolicy::custom(|_, _: &mut (), _| Err(anyhow::anyhow!("vault unavailable")));
    let observer = JsonObserver::object(ObjectBuilder::<()>::new().build()?).with_default_policy(policy);
    let err = observer
        .mask(Some(r#"{"a":"x"}"#), &TransformOptions::default())
        .unwrap_err();
    assert!(matches!(err, JsonVeilError::AnyhowWrapper(_)));
    assert!(err.to_string().contains("vault unavailable"));
    Ok(())
}

#[test]
fn test_comments_follow_reader_and_options() -> Result<()> {
    let observer = JsonObserver::object(ObjectBuilder::<()>::new().build()?)
        .with_default_policy(ValuePolicy::BlockList);
    let input = "/* lead */{\"a\":1, // note\n\"b\":2}";

    let kept = TransformOptions::default().comment_handling(CommentHandling::Allow);
    assert_eq!(
        observer.mask(Some(input), &kept)?.as_deref(),
        Some("/* lead */{\"a\":1/* note*/,\"b\":2}")
    );

    let skipped = TransformOptions::default().comment_handling(CommentHandling::Skip);
    assert_eq!(observer.mask(Some(input), &skipped)?.as_deref(), Some(r#"{"a":1,"b":2}"#));

    let ignored = kept.ignore_comments(true);
    assert_eq!(observer.mask(Some(input), &ignored)?.as_deref(), Some(r#"{"a":1,"b":2}"#));

    assert!(observer.mask(Some(input), &TransformOptions::default()).is_err());
    Ok(())
}

#[test]
fn test_indented_output_is_valid_json() -> Result<()> {
    let observer = JsonObserver::object(ObjectBuilder::<()>::new().property("id").unmasked().build()?);
    let out = observer
        .mask(Some(r#"{"id":1,"tags":["a"],"empty":{}}"#), &TransformOptions::default().indented(true))?
        .expect("input was given");
    assert!(out.contains('\n'));
    let value: Value = serde_json::from_str(&out)?;
    assert_eq!(value, json!({"id": 1, "tags": [STRING_PLACEHOLDER], "empty": {}}));
    Ok(())
}

#[test]
fn test_bad_rules_are_reported_together() {
    let err = ObjectBuilder::<()>::new()
        .pattern("(unclosed").unmasked()
        .property("ok").unmasked()
        .property(Vec::<PropMatch>::new()).unmasked()
        .build()
        .err()
        .expect("build must fail");
    assert!(matches!(err, JsonVeilError::Fatal(_)));
    assert!(err.to_string().contains("Failed to compile 2 object rule(s)"));
}
