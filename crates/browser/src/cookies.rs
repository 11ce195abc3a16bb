use chromiumoxide::cdp::browser_protocol::network::{
    Cookie, CookiePriority, CookieSameSite, GetCookiesParams, SetCookieParams, TimeSinceEpoch,
};
use chromiumoxide::page::Page;
use moorage_core::{CookieRecord, WaitError};
use moorage_store::CookieStore;
use tracing::debug;

/// Reads every cookie the browser holds, applies `apply` to each record,
/// and persists the result.
pub async fn save<S>(
    page: &Page,
    store: &S,
    mut apply: impl FnMut(&mut CookieRecord),
) -> Result<(), WaitError>
where
    S: CookieStore + ?Sized,
{
    let response = page
        .execute(GetCookiesParams::default())
        .await
        .map_err(|e| WaitError::Driver(format!("cookie read failed: {e}")))?;

    let mut records: Vec<CookieRecord> = response.result.cookies.iter().map(to_record).collect();
    for record in &mut records {
        apply(record);
    }
    debug!(count = records.len(), "saving cookies");
    store
        .save(&records)
        .await
        .map_err(|e| WaitError::Driver(format!("cookie store failed: {e}")))?;
    Ok(())
}

/// Loads persisted cookies, keeps those matching `keep`, and installs them
/// one by one. The browser acknowledging a cookie but refusing to store it
/// is an error, not a silent skip.
pub async fn restore<S>(
    page: &Page,
    store: &S,
    keep: impl Fn(&CookieRecord) -> bool,
) -> Result<(), WaitError>
where
    S: CookieStore + ?Sized,
{
    let records = store
        .load()
        .await
        .map_err(|e| WaitError::Driver(format!("cookie store failed: {e}")))?;
    let records: Vec<_> = records.into_iter().filter(|r| keep(r)).collect();
    debug!(count = records.len(), "restoring cookies");

    for record in &records {
        let mut builder = SetCookieParams::builder()
            .name(&record.name)
            .value(&record.value)
            .domain(&record.domain)
            .path(&record.path)
            .secure(record.secure)
            .http_only(record.http_only);
        if record.expires >= 0.0 {
            builder = builder.expires(TimeSinceEpoch::new(record.expires));
        }
        if let Some(same_site) = record.same_site.as_deref().and_then(same_site_from) {
            builder = builder.same_site(same_site);
        }
        if let Some(priority) = record.priority.as_deref().and_then(priority_from) {
            builder = builder.priority(priority);
        }
        let params = builder
            .build()
            .map_err(|e| WaitError::Driver(format!("cookie build failed: {e}")))?;

        let response = page
            .execute(params)
            .await
            .map_err(|e| WaitError::Driver(format!("cookie set failed: {e}")))?;
        if !response.result.success {
            return Err(WaitError::Cookie {
                name: record.name.clone(),
                value: record.value.clone(),
            });
        }
    }
    Ok(())
}

fn to_record(cookie: &Cookie) -> CookieRecord {
    CookieRecord {
        name: cookie.name.clone(),
        value: cookie.value.clone(),
        domain: cookie.domain.clone(),
        path: cookie.path.clone(),
        expires: cookie.expires,
        size: cookie.size,
        http_only: cookie.http_only,
        secure: cookie.secure,
        session: cookie.session,
        same_site: cookie.same_site.as_ref().map(|s| format!("{s:?}")),
        priority: Some(format!("{:?}", cookie.priority)),
    }
}

fn same_site_from(label: &str) -> Option<CookieSameSite> {
    match label {
        "Strict" => Some(CookieSameSite::Strict),
        "Lax" => Some(CookieSameSite::Lax),
        "None" => Some(CookieSameSite::None),
        _ => None,
    }
}

fn priority_from(label: &str) -> Option<CookiePriority> {
    match label {
        "Low" => Some(CookiePriority::Low),
        "Medium" => Some(CookiePriority::Medium),
        "High" => Some(CookiePriority::High),
        _ => None,
    }
}
