use crate::types::{Skill, ToolKind};

use super::{ActionDef, ItemDef, PurchaseDef, Registry};

impl Registry {
    /// The built-in dataset: three gathering lines, two consuming lines and a
    /// thieving line, plus the tool upgrade shop. Covers every mechanic the
    /// solver handles without loading external data.
    pub fn standard() -> Registry {
        let mut r = Registry::new();

        // Items
        r.add_item(ItemDef::new("idle:normal_logs", "Normal Logs", 1.0));
        r.add_item(ItemDef::new("idle:oak_logs", "Oak Logs", 5.0));
        r.add_item(ItemDef::new("idle:willow_logs", "Willow Logs", 12.0));
        r.add_item(ItemDef::new("idle:maple_logs", "Maple Logs", 25.0));
        r.add_item(ItemDef::new("idle:raw_shrimp", "Raw Shrimp", 1.0));
        r.add_item(ItemDef::new("idle:raw_sardine", "Raw Sardine", 3.0));
        r.add_item(ItemDef::new("idle:raw_trout", "Raw Trout", 8.0));
        r.add_item(ItemDef::new("idle:shrimp", "Shrimp", 2.0).consumable());
        r.add_item(ItemDef::new("idle:sardine", "Sardine", 5.0).consumable());
        r.add_item(ItemDef::new("idle:trout", "Trout", 15.0).consumable());
        r.add_item(ItemDef::new("idle:copper_ore", "Copper Ore", 2.0));
        r.add_item(ItemDef::new("idle:tin_ore", "Tin Ore", 2.0));
        r.add_item(ItemDef::new("idle:iron_ore", "Iron Ore", 5.0));
        r.add_item(ItemDef::new("idle:coal", "Coal", 8.0));
        r.add_item(ItemDef::new("idle:bronze_bar", "Bronze Bar", 8.0));
        r.add_item(ItemDef::new("idle:iron_bar", "Iron Bar", 20.0));
        r.add_item(ItemDef::new("idle:steel_bar", "Steel Bar", 45.0));
        r.add_item(ItemDef::new("idle:bronze_dagger", "Bronze Dagger", 15.0));
        r.add_item(ItemDef::new("idle:emerald", "Emerald", 100.0));

        // Woodcutting
        r.add_action(
            ActionDef::new(
                "idle:cut_normal_logs",
                "Cut Normal Logs",
                Skill::Woodcutting,
                1,
                30.0,
                10.0,
            )
            .with_output("idle:normal_logs", 1),
        );
        r.add_action(
            ActionDef::new(
                "idle:cut_oak_logs",
                "Cut Oak Logs",
                Skill::Woodcutting,
                15,
                40.0,
                15.0,
            )
            .with_output("idle:oak_logs", 1),
        );
        r.add_action(
            ActionDef::new(
                "idle:cut_willow_logs",
                "Cut Willow Logs",
                Skill::Woodcutting,
                30,
                50.0,
                22.0,
            )
            .with_output("idle:willow_logs", 1),
        );
        r.add_action(
            ActionDef::new(
                "idle:cut_maple_logs",
                "Cut Maple Logs",
                Skill::Woodcutting,
                45,
                60.0,
                30.0,
            )
            .with_output("idle:maple_logs", 1),
        );

        // Fishing
        r.add_action(
            ActionDef::new("idle:fish_shrimp", "Fish Shrimp", Skill::Fishing, 1, 40.0, 5.0)
                .with_output("idle:raw_shrimp", 1),
        );
        r.add_action(
            ActionDef::new(
                "idle:fish_sardine",
                "Fish Sardine",
                Skill::Fishing,
                5,
                45.0,
                9.0,
            )
            .with_output("idle:raw_sardine", 1),
        );
        r.add_action(
            ActionDef::new("idle:fish_trout", "Fish Trout", Skill::Fishing, 20, 55.0, 18.0)
                .with_output("idle:raw_trout", 1),
        );

        // Cooking (consuming)
        r.add_action(
            ActionDef::new("idle:cook_shrimp", "Cook Shrimp", Skill::Cooking, 1, 30.0, 7.0)
                .with_input("idle:raw_shrimp", 1)
                .with_output("idle:shrimp", 1),
        );
        r.add_action(
            ActionDef::new(
                "idle:cook_sardine",
                "Cook Sardine",
                Skill::Cooking,
                5,
                30.0,
                10.0,
            )
            .with_input("idle:raw_sardine", 1)
            .with_output("idle:sardine", 1),
        );
        r.add_action(
            ActionDef::new("idle:cook_trout", "Cook Trout", Skill::Cooking, 15, 35.0, 18.0)
                .with_input("idle:raw_trout", 1)
                .with_output("idle:trout", 1),
        );

        // Mining
        r.add_action(
            ActionDef::new("idle:mine_copper", "Copper Rocks", Skill::Mining, 1, 50.0, 7.0)
                .with_output("idle:copper_ore", 1)
                .with_byproduct("idle:emerald", 0.01),
        );
        r.add_action(
            ActionDef::new("idle:mine_tin", "Tin Rocks", Skill::Mining, 1, 50.0, 7.0)
                .with_output("idle:tin_ore", 1)
                .with_byproduct("idle:emerald", 0.01),
        );
        r.add_action(
            ActionDef::new("idle:mine_iron", "Iron Rocks", Skill::Mining, 15, 60.0, 12.0)
                .with_output("idle:iron_ore", 1)
                .with_byproduct("idle:emerald", 0.01),
        );
        r.add_action(
            ActionDef::new("idle:mine_coal", "Coal Rocks", Skill::Mining, 30, 70.0, 17.0)
                .with_output("idle:coal", 1)
                .with_byproduct("idle:emerald", 0.01),
        );

        // Smithing (consuming)
        r.add_action(
            ActionDef::new(
                "idle:smelt_bronze",
                "Smelt Bronze Bar",
                Skill::Smithing,
                1,
                40.0,
                8.0,
            )
            .with_input("idle:copper_ore", 1)
            .with_input("idle:tin_ore", 1)
            .with_output("idle:bronze_bar", 1),
        );
        r.add_action(
            ActionDef::new(
                "idle:smith_bronze_dagger",
                "Smith Bronze Dagger",
                Skill::Smithing,
                5,
                40.0,
                12.0,
            )
            .with_input("idle:bronze_bar", 1)
            .with_output("idle:bronze_dagger", 1),
        );
        r.add_action(
            ActionDef::new(
                "idle:smelt_iron",
                "Smelt Iron Bar",
                Skill::Smithing,
                15,
                45.0,
                15.0,
            )
            .with_input("idle:iron_ore", 1)
            .with_input("idle:coal", 1)
            .with_output("idle:iron_bar", 1),
        );
        r.add_action(
            ActionDef::new(
                "idle:smelt_steel",
                "Smelt Steel Bar",
                Skill::Smithing,
                30,
                50.0,
                22.0,
            )
            .with_input("idle:iron_ore", 1)
            .with_input("idle:coal", 2)
            .with_output("idle:steel_bar", 1),
        );

        // Thieving
        r.add_action(
            ActionDef::new(
                "idle:pickpocket_man",
                "Pickpocket Man",
                Skill::Thieving,
                1,
                30.0,
                8.0,
            )
            .with_thieving(40.0, 10.0, 60.0),
        );
        r.add_action(
            ActionDef::new(
                "idle:pickpocket_farmer",
                "Pickpocket Farmer",
                Skill::Thieving,
                15,
                35.0,
                16.0,
            )
            .with_thieving(70.0, 30.0, 90.0),
        );
        r.add_action(
            ActionDef::new(
                "idle:pickpocket_merchant",
                "Pickpocket Merchant",
                Skill::Thieving,
                30,
                40.0,
                28.0,
            )
            .with_thieving(110.0, 80.0, 120.0),
        );

        // Shop
        r.add_purchase(
            PurchaseDef::new("idle:iron_axe", "Iron Axe", 50.0, 0.95)
                .as_tool(ToolKind::Axe)
                .with_requirement(Skill::Woodcutting, 1)
                .affecting(Skill::Woodcutting),
        );
        r.add_purchase(
            PurchaseDef::new("idle:steel_axe", "Steel Axe", 750.0, 0.90)
                .as_tool(ToolKind::Axe)
                .with_requirement(Skill::Woodcutting, 10)
                .affecting(Skill::Woodcutting),
        );
        r.add_purchase(
            PurchaseDef::new("idle:iron_pickaxe", "Iron Pickaxe", 50.0, 0.95)
                .as_tool(ToolKind::Pickaxe)
                .with_requirement(Skill::Mining, 1)
                .affecting(Skill::Mining),
        );
        r.add_purchase(
            PurchaseDef::new("idle:steel_pickaxe", "Steel Pickaxe", 750.0, 0.90)
                .as_tool(ToolKind::Pickaxe)
                .with_requirement(Skill::Mining, 10)
                .affecting(Skill::Mining),
        );
        r.add_purchase(
            PurchaseDef::new("idle:oak_fishing_rod", "Oak Fishing Rod", 100.0, 0.95)
                .as_tool(ToolKind::FishingRod)
                .with_requirement(Skill::Fishing, 1)
                .affecting(Skill::Fishing),
        );
        r.add_purchase(
            PurchaseDef::new("idle:willow_fishing_rod", "Willow Fishing Rod", 900.0, 0.90)
                .as_tool(ToolKind::FishingRod)
                .with_requirement(Skill::Fishing, 10)
                .affecting(Skill::Fishing),
        );

        r
    }
}
