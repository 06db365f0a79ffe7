use std::collections::HashMap;

use crate::config::AppConfig;

/// Maps the app name the model uses in `Launch` to a package identifier.
pub trait AppResolver: Send + Sync {
    /// Unknown labels are returned unchanged (they may already be package ids).
    fn resolve(&self, label: &str) -> String;
}

/// Built-in label → package table.
const BUILTIN_APPS: &[(&str, &str)] = &[
    ("微信", "com.tencent.mm"),
    ("WeChat", "com.tencent.mm"),
    ("QQ", "com.tencent.mobileqq"),
    ("微博", "com.sina.weibo"),
    ("淘宝", "com.taobao.taobao"),
    ("京东", "com.jingdong.app.mall"),
    ("拼多多", "com.xunmeng.pinduoduo"),
    ("小红书", "com.xingin.xhs"),
    ("知乎", "com.zhihu.android"),
    ("高德地图", "com.autonavi.minimap"),
    ("百度地图", "com.baidu.BaiduMap"),
    ("美团", "com.sankuai.meituan"),
    ("大众点评", "com.dianping.v1"),
    ("饿了么", "me.ele"),
    ("携程", "ctrip.android.view"),
    ("12306", "com.MobileTicket"),
    ("铁路12306", "com.MobileTicket"),
    ("滴滴出行", "com.sdu.did.psnger"),
    ("bilibili", "tv.danmaku.bili"),
    ("抖音", "com.ss.android.ugc.aweme"),
    ("快手", "com.smile.gifmaker"),
    ("网易云音乐", "com.netease.cloudmusic"),
    ("QQ音乐", "com.tencent.qqmusic"),
    ("飞书", "com.ss.android.lark"),
    ("钉钉", "com.alibaba.android.rimet"),
    ("今日头条", "com.ss.android.article.news"),
    ("设置", "com.android.settings"),
    ("Settings", "com.android.settings"),
    ("Chrome", "com.android.chrome"),
    ("Clock", "com.android.deskclock"),
    ("Contacts", "com.android.contacts"),
    ("Gmail", "com.google.android.gm"),
    ("Google Maps", "com.google.android.apps.maps"),
    ("Google Play Store", "com.android.vending"),
    ("Telegram", "org.telegram.messenger"),
    ("WhatsApp", "com.whatsapp"),
];

/// Static table plus user overrides from the `[apps]` config section.
#[derive(Debug, Clone)]
pub struct StaticAppResolver {
    table: HashMap<String, String>,
}

impl StaticAppResolver {
    pub fn builtin() -> Self {
        Self {
            table: BUILTIN_APPS
                .iter()
                .map(|(label, pkg)| (label.to_string(), pkg.to_string()))
                .collect(),
        }
    }

    /// Built-in table layered with the `[apps]` section of `config.toml`.
    pub fn from_config(cfg: &AppConfig) -> Self {
        Self::builtin().with_overrides(&cfg.apps)
    }

    /// Overrides win over built-in entries.
    pub fn with_overrides(mut self, overrides: &HashMap<String, String>) -> Self {
        self.table
            .extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }

    /// Reverse lookup, for descriptor providers that only see package ids.
    pub fn label_for_package(&self, package: &str) -> Option<&str> {
        BUILTIN_APPS
            .iter()
            .find(|(_, pkg)| *pkg == package)
            .map(|(label, _)| *label)
    }
}

impl Default for StaticAppResolver {
    fn default() -> Self {
        Self::builtin()
    }
}

impl AppResolver for StaticAppResolver {
    fn resolve(&self, label: &str) -> String {
        let key = label.trim();
        match self.table.get(key) {
            Some(pkg) => pkg.clone(),
            None => {
                tracing::debug!(label = %key, "no package mapping, using label as package id");
                key.to_string()
            }
        }
    }
}
