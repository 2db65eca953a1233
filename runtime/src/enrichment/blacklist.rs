//! Websites that are never worth crawling: aggregators, social networks,
//! agents, single-store pages, parked domains and other non-centre sites.

/// Matched as case-insensitive substrings of the location's website.
pub const BLACKLISTED_DOMAINS: &[&str] = &[
    // Aggregators and listings
    "completelyretail.co.uk",
    "yell.com",
    "tripadvisor.co.uk",
    "yelp.co.uk",
    // Social
    "google.com",
    "facebook.com",
    "instagram.com",
    "twitter.com",
    "linkedin.com",
    // Property and agents
    "rightmove.co.uk",
    "zoopla.co.uk",
    "inpost.co.uk",
    "consolprop.co.uk",
    "derwentlondon.com",
    "evolveestates.com",
    "marshallcdp.com",
    "clowes.co.uk",
    "nrr.co.uk",
    "ashbycapital.com",
    "xprop.co.uk",
    "fletchermorgan.co.uk",
    // Single-retailer store finders
    "currys.co.uk/store-finder",
    "next.co.uk/storelocator",
    "my.morrisons.com/storefinder",
    "store.homebase.co.uk",
    "therange.co.uk/stores",
    "poundland.co.uk/store-finder",
    "anytimefitness.co.uk",
    "snapfitness.com",
    // Supermarket homepages
    "www.tesco.com",
    "www.asda.com",
    "www.lidl.co.uk",
    // Parked domains
    "poi.place",
    "domain-parking.uk",
    "ukbackorder.uk",
    "perfectdomains.co.uk",
    "easyspace.com",
    // Non-retail
    "networkspace.co.uk",
    "parkopedia.co.uk",
    "investinshropshire.co.uk",
    "haloleisure.org.uk",
    "waterworld.co.uk",
    "jumpinfun.co.uk",
    "stadiumcarparks.co.uk",
    "majestic.co.uk",
    "bostontestingstation.co.uk",
    "atlanticbowl.co.uk",
    "ageuk.org.uk",
    "showcasecinemas.co.uk",
    "supplementfactoryuk.com",
    "lincolnshire.coop",
    "britishland.com",
    "cardfactory.co.uk",
    // Business parks
    "aibp.co.uk",
    "gillinghambusinesspark.co.uk",
    "gemini8.co.uk",
    // News and local directories
    "wirralglobe.co.uk",
    "huddersfieldonline.co.uk",
    "rotherhamweb.co.uk",
    // Government and tourism
    "visittamworth.co.uk",
    ".gov.uk",
];

pub fn is_blacklisted(website: &str) -> bool {
    let lower = website.to_lowercase();
    BLACKLISTED_DOMAINS.iter().any(|d| lower.contains(d))
}

/// Prefix `https://` onto a bare host.
pub fn normalize_website(website: &str) -> String {
    let trimmed = website.trim();
    if trimmed.starts_with("http") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blacklist_substring_match() {
        assert!(is_blacklisted("https://www.yell.com/biz/centre"));
        assert!(is_blacklisted("WWW.FACEBOOK.COM/centre"));
        assert!(is_blacklisted("https://www.leeds.gov.uk/markets"));
        assert!(is_blacklisted("next.co.uk/storelocator/leeds"));
        assert!(!is_blacklisted("https://www.next.co.uk"));
        assert!(!is_blacklisted("https://trinityleeds.com"));
    }

    #[test]
    fn test_normalize_website() {
        assert_eq!(normalize_website("trinityleeds.com"), "https://trinityleeds.com");
        assert_eq!(normalize_website("http://a.com"), "http://a.com");
        assert_eq!(normalize_website(" https://b.com "), "https://b.com");
    }
}
