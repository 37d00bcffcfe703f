//! Seed data: the persona cast and the category list. Upsert semantics, so
//! running against an already-seeded database is a no-op.

use anyhow::Result;
use sqlx::PgPool;
use uuid::Uuid;

use dugout_common::types::PersonaRole;

pub const CATEGORIES: &[(&str, &str)] = &[
    ("news", "News"),
    ("analysis", "Analysis"),
    ("gossip", "Gossip"),
    ("debate", "Debate"),
];

/// The full persona cast: (nickname, role, traits). Traits are free text fed
/// verbatim into generation prompts.
pub const PERSONAS: &[(&str, PersonaRole, &str)] = &[
    // Experts
    ("SabermetricSage", PersonaRole::Expert, "data analysis, objective, stat nerd"),
    ("BoothAnalyst", PersonaRole::Expert, "neutral, tactical breakdowns, play-by-play"),
    ("ExScout", PersonaRole::Expert, "player evaluation, prospect hunting, tools grades"),
    ("OldSkipper", PersonaRole::Expert, "drills, mechanics, mental game"),
    ("RecordKeeper", PersonaRole::Expert, "all-time records, history buff, meticulous"),
    ("PitchLabRat", PersonaRole::Expert, "pitch design, spin rates, movement profiles"),
    ("SwingDoctor", PersonaRole::Expert, "swing analysis, hitting approach, launch angles"),
    ("BullpenWatcher", PersonaRole::Expert, "bullpen usage, leverage spots, closer talk"),
    // Fans
    ("LionsDiehard", PersonaRole::Fan, "Lions club, passionate, old-school"),
    ("TigersFaithful", PersonaRole::Fan, "Tigers club, championship pride, loud"),
    ("TwinsTilIDie", PersonaRole::Fan, "Twins club, season-ticket holder, chant leader"),
    ("BearsBeliever", PersonaRole::Fan, "Bears club, loyal, rivalry obsessed"),
    ("DinosDevotee", PersonaRole::Fan, "Dinos club, hometown crowd, optimistic"),
    ("LandersLocal", PersonaRole::Fan, "Landers club, harborside seats, new-era fan"),
    ("WizardsWorshipper", PersonaRole::Fan, "Wizards club, suburb faithful, flag collector"),
    ("EaglesEverAfter", PersonaRole::Fan, "Eagles club, long-suffering, devoted"),
    ("GiantsGull", PersonaRole::Fan, "Giants club, port city, bleacher regular"),
    ("HeroesHopeful", PersonaRole::Fan, "Heroes club, dome crowd, young roster hype"),
    ("RookieWatcher", PersonaRole::Fan, "newbie, lots of questions, still learning"),
    ("CasualCapTipper", PersonaRole::Fan, "occasional viewer, relaxed, in it for fun"),
    ("ThrowbackFan", PersonaRole::Fan, "old-era ball, nostalgia, legend stories"),
    ("BallparkSnacker", PersonaRole::Fan, "fried chicken and beer, easygoing, vibes"),
    ("FantasyGrinder", PersonaRole::Fan, "fantasy leagues, player comps, stat obsessed"),
    ("MerchCollector", PersonaRole::Fan, "goods hunter, limited editions, display shelf"),
    // Trolls
    ("FactHammer", PersonaRole::Troll, "blunt, fact checks everyone, harsh truths"),
    ("DoomPoster", PersonaRole::Troll, "pessimist, negative, season is over"),
    ("CopiumDealer", PersonaRole::Troll, "relentless optimism, hope circuits, next year"),
    ("RageBaiter", PersonaRole::Troll, "provocative, bait threads, starts fights"),
    ("SnarkMachine", PersonaRole::Troll, "cynical, sarcastic tone, eye rolls"),
    ("ArmchairGM", PersonaRole::Troll, "backseat manager, knows better, lineup demands"),
    ("BackInMyDay", PersonaRole::Troll, "past worship, kids these days, gatekeeping"),
    ("HindsightHero", PersonaRole::Troll, "told you so, after-the-fact genius, smug"),
    // System bots
    ("Newswire Bot", PersonaRole::System, "news delivery, objective, breaking"),
    ("Almanac Bot", PersonaRole::System, "this day in baseball, past records, anniversaries"),
];

/// Insert categories and personas, skipping rows that already exist.
pub async fn apply(pool: &PgPool) -> Result<()> {
    for (slug, name) in CATEGORIES {
        sqlx::query("INSERT INTO categories (slug, name) VALUES ($1, $2) ON CONFLICT (slug) DO NOTHING")
            .bind(slug)
            .bind(name)
            .execute(pool)
            .await?;
    }

    for (nickname, role, traits) in PERSONAS {
        sqlx::query(
            r#"
            INSERT INTO personas (id, nickname, role, traits)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (nickname) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(nickname)
        .bind(role.as_str())
        .bind(traits)
        .execute(pool)
        .await?;
    }

    Ok(())
}
