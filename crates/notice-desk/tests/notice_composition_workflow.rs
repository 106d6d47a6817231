use std::sync::Arc;

use chrono::{Duration, FixedOffset, TimeZone, Utc};
use notice_desk::workflows::notices::{
    extract_variables, Clock, ComposeContext, ComposerStep, InMemoryRepository, ManualClock,
    NewOfficer, NewTemplate, Notice, NoticeComposer, Officer, OfficerPatch, Region, Repository,
    Template, DEFAULT_DATE_FORMAT,
};

fn clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2026, 8, 14, 1, 15, 0)
            .single()
            .expect("valid start"),
    ))
}

fn context(clock: &ManualClock) -> ComposeContext {
    ComposeContext {
        operator: "Registry Clerk".to_string(),
        sender_name: "Living Council Member".to_string(),
        now: clock
            .now()
            .with_timezone(&FixedOffset::east_opt(9 * 3600 + 1800).expect("darwin offset")),
        date_format: DEFAULT_DATE_FORMAT.to_string(),
    }
}

#[tokio::test]
async fn operator_sends_a_notice_through_every_step() {
    let clock = clock();
    let officers = Arc::new(InMemoryRepository::<Officer>::new(clock.clone()));
    let templates = Arc::new(InMemoryRepository::<Template>::new(clock.clone()));
    let notices = Arc::new(InMemoryRepository::<Notice>::new(clock.clone()));

    let officer = officers
        .create(NewOfficer {
            name: "Lee Moran".to_string(),
            organization: "Northern Territory Police".to_string(),
            state: Region::Nt,
            branch: None,
            office: Some("Darwin".to_string()),
            badge_number: Some("NT-118".to_string()),
            email: "lee.moran@pfes.nt.gov.au".to_string(),
        })
        .await
        .expect("create officer");

    let template = templates
        .create(NewTemplate {
            name: "Notice of Trust".to_string(),
            subject: "Trust notice: {officer.name} ({officer.badgeNumber})".to_string(),
            body: "{officer.name}, {officer.office} station, {officer.state}.\n\
                   Dated {notice.date}.\n{sender.name}"
                .to_string(),
            category: "trust".to_string(),
            created_by: "Registry Clerk".to_string(),
        })
        .await
        .expect("create template");
    assert_eq!(
        template.variables,
        vec![
            "officer.name",
            "officer.office",
            "officer.state",
            "notice.date",
            "sender.name"
        ]
    );

    let composer = NoticeComposer::new(officers.clone(), templates.clone(), notices.clone());
    composer
        .select_officer(officer.id)
        .await
        .expect("select officer");
    composer.advance().expect("to template step");
    let draft = composer
        .select_template(template.id, &context(&clock))
        .await
        .expect("select template");
    assert_eq!(draft.subject, "Trust notice: Lee Moran (NT-118)");
    assert_eq!(
        draft.body,
        "Lee Moran, Darwin station, NT.\nDated 14/8/2026.\nLiving Council Member"
    );
    assert!(extract_variables(&draft.body).is_empty());

    composer.advance().expect("to review step");
    assert_eq!(composer.step(), ComposerStep::ReviewAndSend);
    composer
        .edit_draft(None, Some(format!("{}\nPlease acknowledge.", draft.body)))
        .expect("edit body");

    clock.advance(Duration::seconds(30));
    let receipt = composer
        .send(&context(&clock))
        .await
        .expect("send notice");
    assert!(receipt.notice.body.ends_with("Please acknowledge."));
    assert_eq!(receipt.notice.sent_by, "Registry Clerk");
    assert_eq!(
        receipt.mail.mailto_uri(),
        "mailto:lee.moran@pfes.nt.gov.au\
         ?subject=Trust%20notice%3A%20Lee%20Moran%20%28NT-118%29\
         &body=Lee%20Moran%2C%20Darwin%20station%2C%20NT.%0ADated%2014%2F8%2F2026.\
         %0ALiving%20Council%20Member%0APlease%20acknowledge."
    );
    assert_eq!(composer.step(), ComposerStep::SelectRecipient);

    officers
        .update(
            officer.id,
            OfficerPatch {
                organization: Some("NT Police, Fire and Emergency Services".to_string()),
                ..OfficerPatch::default()
            },
        )
        .await
        .expect("rename organization");
    let stored = notices
        .get_by_id(receipt.notice.id)
        .await
        .expect("notice stored");
    assert_eq!(stored.organization, "Northern Territory Police");
    assert_eq!(stored.state, Region::Nt);
}
