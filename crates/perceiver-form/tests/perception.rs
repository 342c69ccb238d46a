use perceiver_form::dom::interactive_controls;
use perceiver_form::{
    extract_signals, ignore_reason, infer_from_context, HostDocument, IgnoreReason, PageDom,
    RuleMatcher,
};

const APPLICATION: &str = r#"
<html><body>
<form id="application">
  <div class="form-group">
    <label for="first">First Name</label>
    <input id="first" name="first_name" autocomplete="given-name">
  </div>
  <div class="form-group">
    <label for="mail">Email Address</label>
    <input id="mail" type="email" name="email">
  </div>
  <div class="form-group">
    <label for="cl">Cover Letter</label>
    <p>Tell us about your experience.</p>
    <textarea id="cl" name="cover_letter"></textarea>
  </div>
  <fieldset>
    <legend>Are you legally authorized to work in the United States?</legend>
    <label><input type="radio" name="auth" value="Yes"> Yes</label>
    <label><input type="radio" name="auth" value="No"> No</label>
  </fieldset>
  <div class="application-question">
    <div>What is your gender identity?</div>
    <div role="radiogroup">
      <div role="radio" aria-checked="false">Man</div>
      <div role="radio" aria-checked="false">Woman</div>
    </div>
  </div>
  <input type="hidden" name="csrf" value="t0k3n">
  <input type="submit" value="Apply">
</form>
</body></html>
"#;

fn resolve(page: &PageDom, control: perceiver_form::NodeId) -> Option<String> {
    let matcher = RuleMatcher::default();
    let signals = extract_signals(page, control);
    let reason = ignore_reason(page, control, &signals, matcher.rules());
    if reason.map(IgnoreReason::is_structural).unwrap_or(false) {
        return None;
    }
    let matched = match reason {
        Some(_) => None,
        None => matcher.best_match(&signals).map(|m| m.path),
    };
    infer_from_context(page, control)
        .map(str::to_string)
        .or(matched)
}

#[test]
fn resolves_a_typical_application_page() {
    let page = PageDom::from_html(APPLICATION);
    let controls = interactive_controls(&page);
    let resolved: Vec<(String, Option<String>)> = controls
        .iter()
        .map(|id| {
            let name = page
                .attr(*id, "name")
                .map(str::to_string)
                .unwrap_or_else(|| page.text_content(*id).trim().to_string());
            (name, resolve(&page, *id))
        })
        .collect();

    let expect = |name: &str| {
        resolved
            .iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, path)| path.clone())
    };
    assert_eq!(expect("first_name").as_deref(), Some("identity.first_name"));
    assert_eq!(expect("email").as_deref(), Some("identity.email"));
    assert_eq!(expect("cover_letter"), None);
    assert_eq!(expect("auth").as_deref(), Some("work_auth.eligible_to_work_us"));
    assert_eq!(expect("Man").as_deref(), Some("demographics.gender"));
    assert_eq!(expect("csrf"), None);
}

#[test]
fn cover_letter_is_a_forbidden_topic() {
    let page = PageDom::from_html(APPLICATION);
    let letter = page.by_id("cl").unwrap();
    let signals = extract_signals(&page, letter);
    let matcher = RuleMatcher::default();
    assert_eq!(
        ignore_reason(&page, letter, &signals, matcher.rules()),
        Some(IgnoreReason::ForbiddenTopic)
    );
}
