use dst_core::interactive::Card;
use serenity::builder::{CreateEmbed, CreateEmbedFooter, CreateMessage};

pub fn to_embed(card: &Card) -> CreateEmbed {
    let mut embed = CreateEmbed::new().title(&card.title).color(card.color);
    if let Some(description) = &card.description {
        embed = embed.description(description);
    }
    for field in &card.fields {
        embed = embed.field(&field.name, &field.value, field.inline);
    }
    if let Some(footer) = &card.footer {
        embed = embed.footer(CreateEmbedFooter::new(footer));
    }
    embed
}

pub fn card_message(card: &Card) -> CreateMessage {
    CreateMessage::new().embed(to_embed(card))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copies_card_into_embed() {
        let card = dst_core::interactive::guide_card();
        let json = serde_json::to_value(to_embed(&card)).unwrap();

        assert_eq!(json["title"], card.title.as_str());
        assert_eq!(json["color"], card.color);
        assert_eq!(json["fields"].as_array().map(Vec::len), Some(card.fields.len()));
        assert_eq!(json["description"], card.description.as_deref().unwrap());
    }
}
