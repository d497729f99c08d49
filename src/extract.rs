//! Event listing extraction.
//!
//! The weekly listing page renders one `participantRow` per team, two
//! consecutive rows per game (away first, then home). Everything the
//! merge step needs is pulled from fixed structural positions in the row;
//! scores, dates and statuses are kept verbatim as display strings.

use scraper::{ElementRef, Html, Selector};
use tracing::info;

use crate::config::{Config, DESKTOP_USER_AGENT};
use crate::error::Result;
use crate::fetch;
use crate::schedule::Slate;
use crate::teams::TeamTable;

/// One team's row on the listing page.
#[derive(Debug, Clone)]
pub struct GameMeta {
    /// Event id from the row's matchup link; None when the link is missing
    /// or unparseable.
    pub eid: Option<u64>,
    pub season: u16,
    pub week: u8,
    pub week_label: String,
    pub rotation: Option<u32>,
    /// Team label exactly as rendered by the site.
    pub team: String,
    /// Participant id resolved from the team label via the alias table.
    pub partid: Option<u64>,
    pub date: String,
    pub time: String,
    pub score: String,
    pub status: String,
}

/// Fetch and parse the listing page for a resolved slate, preserving
/// document order (pairing depends on it).
pub async fn extract_game_meta(
    client: &reqwest::Client,
    cfg: &Config,
    teams: &TeamTable,
    slate: &Slate,
) -> Result<Vec<GameMeta>> {
    let url = format!(
        "{}/nfl/?egid={}&seid={}",
        cfg.html_base, slate.egid, slate.seid
    );

    let body = fetch::get_text_with_retry(
        || {
            client
                .get(&url)
                .header(reqwest::header::USER_AGENT, DESKTOP_USER_AGENT)
        },
        "event listing",
    )
    .await?;

    let meta = parse_listing(&body, slate, teams);
    info!(
        "extracted {} participant rows for season {} week {}",
        meta.len(),
        slate.season,
        slate.label
    );
    Ok(meta)
}

/// Parse every participant row out of a listing document.
pub fn parse_listing(html: &str, slate: &Slate, teams: &TeamTable) -> Vec<GameMeta> {
    let document = Html::parse_document(html);

    let row_sel = Selector::parse("tr.participantRow--z17q").unwrap();
    let link_sel = Selector::parse("a.link-1Vzcm").unwrap();
    let when_sel = Selector::parse("div.time-3gPvd").unwrap();
    let date_sel = Selector::parse("span").unwrap();
    let clock_sel = Selector::parse("p").unwrap();
    let team_sel = Selector::parse("div.participantName-3CqB8").unwrap();
    let score_sel = Selector::parse("span.score-3EWei").unwrap();
    let rotation_sel = Selector::parse("td.rotation-3JAfZ").unwrap();
    let status_sel = Selector::parse("span.eventStatusBox-19ZbY").unwrap();

    let mut rows = Vec::new();
    for row in document.select(&row_sel) {
        let eid = row
            .select(&link_sel)
            .next()
            .and_then(|a| a.value().attr("href"))
            .and_then(|href| query_param(href, "eid"))
            .and_then(|v| v.parse().ok());

        // The date/time cell only appears on the first row of each pair.
        let (date, time) = match row.select(&when_sel).next() {
            Some(cell) => (first_text(cell, &date_sel), first_text(cell, &clock_sel)),
            None => (String::new(), String::new()),
        };

        let team = first_text(row, &team_sel);
        let partid = teams.participant_id(&team);

        rows.push(GameMeta {
            eid,
            season: slate.season,
            week: slate.week,
            week_label: slate.label.clone(),
            rotation: first_text(row, &rotation_sel).parse().ok(),
            team,
            partid,
            date,
            time,
            score: first_text(row, &score_sel),
            status: first_text(row, &status_sel),
        });
    }
    rows
}

fn first_text(el: ElementRef<'_>, sel: &Selector) -> String {
    el.select(sel)
        .next()
        .map(|e| e.text().collect::<String>().trim().to_string())
        .unwrap_or_default()
}

/// Pull one query-string parameter out of an href.
fn query_param(href: &str, key: &str) -> Option<String> {
    let (_, query) = href.split_once('?')?;
    query.split('&').find_map(|pair| {
        let (k, v) = pair.split_once('=')?;
        (k == key).then(|| v.to_string())
    })
}
