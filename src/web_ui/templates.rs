//! Template engine setup and HTML templates.

use once_cell::sync::Lazy;
use tera::{Context, Tera};

/// Global template engine instance with embedded templates.
pub static TEMPLATES: Lazy<Tera> = Lazy::new(|| {
    let mut tera = Tera::default();

    // Embed templates directly in the binary (no external files needed)
    tera.add_raw_templates(vec![
        ("base.html", BASE_TEMPLATE),
        ("login.html", LOGIN_TEMPLATE),
        ("error.html", ERROR_TEMPLATE),
        ("admin_dashboard.html", ADMIN_DASHBOARD_TEMPLATE),
        ("admin_add_user.html", ADMIN_ADD_USER_TEMPLATE),
        ("admin_manage_users.html", ADMIN_MANAGE_USERS_TEMPLATE),
        ("admin_view_logs.html", ADMIN_VIEW_LOGS_TEMPLATE),
        ("admin_view_activity.html", ADMIN_VIEW_ACTIVITY_TEMPLATE),
        ("admin_view_reports.html", ADMIN_VIEW_REPORTS_TEMPLATE),
        ("admin_view_leaderboard.html", ADMIN_VIEW_LEADERBOARD_TEMPLATE),
        ("admin_impact.html", ADMIN_IMPACT_TEMPLATE),
        ("canteen_dashboard.html", CANTEEN_DASHBOARD_TEMPLATE),
        ("canteen_add_food.html", CANTEEN_ADD_FOOD_TEMPLATE),
        ("canteen_edit_food.html", CANTEEN_EDIT_FOOD_TEMPLATE),
        ("canteen_manage_requests.html", CANTEEN_MANAGE_REQUESTS_TEMPLATE),
        ("canteen_waste_report.html", CANTEEN_WASTE_REPORT_TEMPLATE),
        ("canteen_leaderboard.html", CANTEEN_LEADERBOARD_TEMPLATE),
        ("ngo_dashboard.html", NGO_DASHBOARD_TEMPLATE),
        ("ngo_history.html", NGO_HISTORY_TEMPLATE),
        ("ngo_record_beneficiaries.html", NGO_RECORD_BENEFICIARIES_TEMPLATE),
    ])
    .expect("Failed to load templates");

    tera
});

/// Render a template with context
pub fn render(template: &str, context: &Context) -> Result<String, tera::Error> {
    TEMPLATES.render(template, context)
}

// =============================================================================
// Embedded Templates
// =============================================================================

const BASE_TEMPLATE: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{% block title %}FoodShare{% endblock %}</title>
    <style>
        :root {
            --bg: #0a0a0a;
            --bg-secondary: #141414;
            --foreground: #fafafa;
            --foreground-secondary: rgba(250, 250, 250, 0.7);
            --border: #262626;
            --success: #4ade80;
            --danger: #f87171;
            --warning: #facc15;
        }

        * { box-sizing: border-box; margin: 0; padding: 0; }

        body {
            font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Helvetica, Arial, sans-serif;
            background: var(--bg);
            color: var(--foreground);
            line-height: 1.6;
            -webkit-font-smoothing: antialiased;
        }

        a { color: var(--foreground); text-decoration: none; }
        a:hover { opacity: 0.7; }

        .header {
            border-bottom: 1px solid var(--border);
            padding: 16px 32px;
            display: flex;
            align-items: center;
            justify-content: space-between;
        }
        .header .logo { font-weight: 700; font-size: 18px; }
        .header nav a { margin-left: 20px; color: var(--foreground-secondary); font-size: 14px; }

        .container { max-width: 1100px; margin: 0 auto; padding: 32px; }

        h1 { font-size: 22px; margin-bottom: 20px; }
        h2 { font-size: 16px; margin: 24px 0 12px; }

        table { width: 100%; border-collapse: collapse; font-size: 14px; }
        th, td { text-align: left; padding: 10px 12px; border-bottom: 1px solid var(--border); }
        th { color: var(--foreground-secondary); font-weight: 500; }

        .flash { padding: 10px 16px; border-radius: 6px; margin-bottom: 20px; font-size: 14px; }
        .flash.error { background: rgba(248, 113, 113, 0.12); color: var(--danger); }
        .flash.success { background: rgba(74, 222, 128, 0.12); color: var(--success); }

        form.stack { display: flex; flex-direction: column; gap: 12px; max-width: 420px; }
        label { font-size: 13px; color: var(--foreground-secondary); }
        input, select, textarea {
            background: var(--bg-secondary);
            border: 1px solid var(--border);
            border-radius: 6px;
            color: var(--foreground);
            padding: 8px 10px;
            font-size: 14px;
            width: 100%;
        }

        button {
            background: var(--foreground);
            color: var(--bg);
            border: none;
            border-radius: 6px;
            padding: 8px 16px;
            font-size: 14px;
            font-weight: 600;
            cursor: pointer;
        }
        button.secondary { background: var(--bg-secondary); color: var(--foreground); border: 1px solid var(--border); }
        button.danger { background: var(--danger); color: var(--bg); }

        .status { font-size: 12px; padding: 2px 8px; border-radius: 10px; border: 1px solid var(--border); }
        .status.available, .status.approved { color: var(--success); }
        .status.pending, .status.requested { color: var(--warning); }
        .status.rejected { color: var(--danger); }
        .status.donated, .status.completed { color: var(--foreground-secondary); }

        tr.expiry-critical td { color: var(--danger); }
        tr.expiry-warning td { color: var(--warning); }

        .stats { display: flex; gap: 16px; flex-wrap: wrap; }
        .stat-card {
            background: var(--bg-secondary);
            border: 1px solid var(--border);
            border-radius: 8px;
            padding: 16px 24px;
            min-width: 160px;
        }
        .stat-card .value { font-size: 26px; font-weight: 700; }
        .stat-card .label { font-size: 13px; color: var(--foreground-secondary); }

        .empty { color: var(--foreground-secondary); padding: 24px 0; font-size: 14px; }
        .inline-form { display: inline; }
    </style>
</head>
<body>
    <div class="header">
        <a class="logo" href="/">FoodShare</a>
        <nav>
            {% if current_role %}
                {% if current_role == "admin" %}
                    <a href="/admin">Dashboard</a>
                    <a href="/admin/add_user">Add User</a>
                    <a href="/admin/manage_users">Users</a>
                    <a href="/admin/view_logs">Logs</a>
                    <a href="/admin/view_activity">Activity</a>
                    <a href="/admin/view_reports">Waste Reports</a>
                    <a href="/admin/view_leaderboard">Leaderboard</a>
                    <a href="/admin/impact">Impact</a>
                {% elif current_role == "canteen" %}
                    <a href="/canteen">Dashboard</a>
                    <a href="/canteen/add_food">Add Food</a>
                    <a href="/canteen/manage_requests">Requests</a>
                    <a href="/canteen/file_waste_report">Report Waste</a>
                    <a href="/canteen/leaderboard">Leaderboard</a>
                {% elif current_role == "ngo" %}
                    <a href="/ngo">Dashboard</a>
                    <a href="/ngo/history">History</a>
                    <a href="/ngo/record_beneficiaries">Record Impact</a>
                {% endif %}
                <a href="/logout">Sign out ({{ current_user }})</a>
            {% else %}
                <a href="/login">Sign in</a>
            {% endif %}
        </nav>
    </div>
    <div class="container">
        {% if error %}<div class="flash error">{{ error }}</div>{% endif %}
        {% if message %}<div class="flash success">{{ message }}</div>{% endif %}
        {% block content %}{% endblock %}
    </div>
</body>
</html>"##;

const LOGIN_TEMPLATE: &str = r##"{% extends "base.html" %}
{% block title %}Sign in - FoodShare{% endblock %}
{% block content %}
<h1>Sign in</h1>
<form class="stack" method="post" action="/login">
    <label>Username
        <input type="text" name="username" required autofocus>
    </label>
    <label>Password
        <input type="password" name="password" required>
    </label>
    <button type="submit">Sign in</button>
</form>
{% endblock %}"##;

const ERROR_TEMPLATE: &str = r##"{% extends "base.html" %}
{% block title %}Error - FoodShare{% endblock %}
{% block content %}
<h1>Something went wrong</h1>
<p class="empty">{{ message }}</p>
{% endblock %}"##;

const ADMIN_DASHBOARD_TEMPLATE: &str = r##"{% extends "base.html" %}
{% block title %}Admin - FoodShare{% endblock %}
{% block content %}
<h1>Administration</h1>
<div class="stats">
    <div class="stat-card"><div class="value">{{ user_count }}</div><div class="label">Accounts</div></div>
    <div class="stat-card"><div class="value">{{ food_count }}</div><div class="label">Food listings</div></div>
    <div class="stat-card"><div class="value">{{ pending_count }}</div><div class="label">Pending requests</div></div>
    <div class="stat-card"><div class="value">{{ report_count }}</div><div class="label">Waste reports</div></div>
</div>
{% endblock %}"##;

const ADMIN_ADD_USER_TEMPLATE: &str = r##"{% extends "base.html" %}
{% block title %}Add User - FoodShare{% endblock %}
{% block content %}
<h1>Add User</h1>
<form class="stack" method="post" action="/admin/add_user">
    <label>Username
        <input type="text" name="username" required>
    </label>
    <label>Email
        <input type="email" name="email" required>
    </label>
    <label>Password
        <input type="password" name="password" required>
    </label>
    <label>Role
        <select name="role" required>
            <option value="admin">Admin</option>
            <option value="canteen">Canteen</option>
            <option value="ngo">NGO</option>
        </select>
    </label>
    <label>Canteen (for canteen accounts)
        <select name="canteen_id">
            <option value="">-</option>
            {% for c in canteens %}<option value="{{ c.id }}">{{ c.name }}</option>{% endfor %}
        </select>
    </label>
    <label>NGO (for NGO accounts)
        <select name="ngo_id">
            <option value="">-</option>
            {% for n in ngos %}<option value="{{ n.id }}">{{ n.name }}</option>{% endfor %}
        </select>
    </label>
    <button type="submit">Create account</button>
</form>
{% endblock %}"##;

const ADMIN_MANAGE_USERS_TEMPLATE: &str = r##"{% extends "base.html" %}
{% block title %}Manage Users - FoodShare{% endblock %}
{% block content %}
<h1>Manage Users</h1>
{% if users %}
<table>
    <tr><th>ID</th><th>Account</th><th>Actions</th></tr>
    {% for u in users %}
    <tr>
        <td>{{ u.id }}</td>
        <td>
            <form class="stack" method="post" action="/admin/manage_users">
                <input type="hidden" name="action" value="edit">
                <input type="hidden" name="user_id" value="{{ u.id }}">
                <input type="text" name="username" value="{{ u.username }}" required>
                <input type="email" name="email" value="{{ u.email }}" required>
                <input type="password" name="password" placeholder="New password (leave blank to keep)">
                <select name="role">
                    <option value="admin" {% if u.role == "admin" %}selected{% endif %}>Admin</option>
                    <option value="canteen" {% if u.role == "canteen" %}selected{% endif %}>Canteen</option>
                    <option value="ngo" {% if u.role == "ngo" %}selected{% endif %}>NGO</option>
                </select>
                <select name="canteen_id">
                    <option value="">-</option>
                    {% for c in canteens %}<option value="{{ c.id }}" {% if u.role == "canteen" and u.ref_id == c.id %}selected{% endif %}>{{ c.name }}</option>{% endfor %}
                </select>
                <select name="ngo_id">
                    <option value="">-</option>
                    {% for n in ngos %}<option value="{{ n.id }}" {% if u.role == "ngo" and u.ref_id == n.id %}selected{% endif %}>{{ n.name }}</option>{% endfor %}
                </select>
                <button type="submit">Save</button>
            </form>
        </td>
        <td>
            <form class="inline-form" method="post" action="/admin/manage_users">
                <input type="hidden" name="action" value="delete">
                <input type="hidden" name="user_id" value="{{ u.id }}">
                <button class="danger" type="submit">Delete</button>
            </form>
        </td>
    </tr>
    {% endfor %}
</table>
{% else %}
<p class="empty">No accounts yet.</p>
{% endif %}
{% endblock %}"##;

const ADMIN_VIEW_LOGS_TEMPLATE: &str = r##"{% extends "base.html" %}
{% block title %}Audit Log - FoodShare{% endblock %}
{% block content %}
<h1>Audit Log</h1>
{% if logs %}
<table>
    <tr><th>Action</th><th>Table</th><th>Record</th><th>By</th><th>When</th></tr>
    {% for l in logs %}
    <tr>
        <td>{{ l.action }}</td>
        <td>{{ l.table_name }}</td>
        <td>{{ l.record_id }}</td>
        <td>{{ l.performed_by }}</td>
        <td>{{ l.event_time }}</td>
    </tr>
    {% endfor %}
</table>
{% else %}
<p class="empty">Nothing has been logged yet.</p>
{% endif %}
{% endblock %}"##;

const ADMIN_VIEW_ACTIVITY_TEMPLATE: &str = r##"{% extends "base.html" %}
{% block title %}Login Activity - FoodShare{% endblock %}
{% block content %}
<h1>Login Activity</h1>
{% if activities %}
<table>
    <tr><th>User</th><th>Login time</th><th>IP address</th></tr>
    {% for a in activities %}
    <tr><td>{{ a.username }}</td><td>{{ a.login_time }}</td><td>{{ a.ip_address }}</td></tr>
    {% endfor %}
</table>
{% else %}
<p class="empty">No logins recorded.</p>
{% endif %}
{% endblock %}"##;

const ADMIN_VIEW_REPORTS_TEMPLATE: &str = r##"{% extends "base.html" %}
{% block title %}Waste Reports - FoodShare{% endblock %}
{% block content %}
<h1>Waste Reports</h1>
{% if reports %}
<table>
    <tr><th>Item</th><th>Reporter</th><th>Reason</th><th>Quantity wasted</th><th>When</th></tr>
    {% for r in reports %}
    <tr>
        <td>{{ r.item_name }}</td>
        <td>{{ r.reporter }}</td>
        <td>{{ r.reason }}</td>
        <td>{{ r.quantity_wasted }}</td>
        <td>{{ r.report_time }}</td>
    </tr>
    {% endfor %}
</table>
{% else %}
<p class="empty">No waste reports filed.</p>
{% endif %}
{% endblock %}"##;

const ADMIN_VIEW_LEADERBOARD_TEMPLATE: &str = r##"{% extends "base.html" %}
{% block title %}Leaderboard - FoodShare{% endblock %}
{% block content %}
<h1>Waste-Reduction Leaderboard</h1>
{% if leaderboard %}
<table>
    <tr><th>Canteen</th><th>Total items</th><th>Donated items</th><th>Score</th></tr>
    {% for l in leaderboard %}
    <tr>
        <td>{{ l.canteen }}</td>
        <td>{{ l.total_items }}</td>
        <td>{{ l.donated_items }}</td>
        <td>{{ l.waste_score }}</td>
    </tr>
    {% endfor %}
</table>
{% else %}
<p class="empty">No canteen has listed food yet.</p>
{% endif %}
{% endblock %}"##;

const ADMIN_IMPACT_TEMPLATE: &str = r##"{% extends "base.html" %}
{% block title %}Impact - FoodShare{% endblock %}
{% block content %}
<h1>Donation Impact</h1>
{% if impact_data %}
<table>
    <tr><th>Donation</th><th>People served</th><th>Location</th><th>Recorded</th></tr>
    {% for m in impact_data %}
    <tr>
        <td>#{{ m.donation_id }}</td>
        <td>{{ m.people_served }}</td>
        <td>{{ m.location }}</td>
        <td>{{ m.recorded_time }}</td>
    </tr>
    {% endfor %}
</table>
{% else %}
<p class="empty">No beneficiary records yet.</p>
{% endif %}
{% endblock %}"##;

const CANTEEN_DASHBOARD_TEMPLATE: &str = r##"{% extends "base.html" %}
{% block title %}{{ canteen_name }} - FoodShare{% endblock %}
{% block content %}
<h1>{{ canteen_name }}</h1>
{% if food_items %}
<table>
    <tr><th>Item</th><th>Category</th><th>Quantity</th><th>Expires</th><th>Status</th><th>Notes</th><th></th></tr>
    {% for f in food_items %}
    <tr class="{{ f.expiry_class }}">
        <td>{{ f.item_name }}</td>
        <td>{{ f.category }}</td>
        <td>{{ f.quantity }} {{ f.unit }}</td>
        <td>{{ f.expiry_time }}</td>
        <td><span class="status {{ f.status }}">{{ f.status }}</span></td>
        <td>{{ f.notes }}</td>
        <td>
            <a href="/canteen/edit_food/{{ f.id }}">Edit</a>
            <form class="inline-form" method="post" action="/canteen/delete_food/{{ f.id }}">
                <button class="secondary" type="submit">Delete</button>
            </form>
        </td>
    </tr>
    {% endfor %}
</table>
{% else %}
<p class="empty">No food listed. <a href="/canteen/add_food">Add your first listing.</a></p>
{% endif %}
{% endblock %}"##;

const CANTEEN_ADD_FOOD_TEMPLATE: &str = r##"{% extends "base.html" %}
{% block title %}Add Food - FoodShare{% endblock %}
{% block content %}
<h1>Add Food</h1>
<form class="stack" method="post" action="/canteen/add_food">
    <label>Item name
        <input type="text" name="item_name" required>
    </label>
    <label>Category
        <input type="text" name="category" required>
    </label>
    <label>Quantity
        <input type="number" name="quantity" min="1" required>
    </label>
    <label>Unit
        <input type="text" name="unit" placeholder="kg, servings, ..." required>
    </label>
    <label>Expiry time
        <input type="datetime-local" name="expiry_time" required>
    </label>
    <label>Notes
        <textarea name="notes" rows="3"></textarea>
    </label>
    <button type="submit">Add listing</button>
</form>
{% endblock %}"##;

const CANTEEN_EDIT_FOOD_TEMPLATE: &str = r##"{% extends "base.html" %}
{% block title %}Edit {{ item_name }} - FoodShare{% endblock %}
{% block content %}
<h1>Edit {{ item_name }}</h1>
<form class="stack" method="post" action="/canteen/edit_food/{{ food_id }}">
    <label>Item name
        <input type="text" name="item_name" value="{{ item_name }}" required>
    </label>
    <label>Category
        <input type="text" name="category" value="{{ category }}" required>
    </label>
    <label>Quantity
        <input type="number" name="quantity" min="1" value="{{ quantity }}" required>
    </label>
    <label>Unit
        <input type="text" name="unit" value="{{ unit }}" required>
    </label>
    <label>Expiry time
        <input type="datetime-local" name="expiry_time" value="{{ expiry_time }}" required>
    </label>
    <label>Notes
        <textarea name="notes" rows="3">{{ notes }}</textarea>
    </label>
    <button type="submit">Save changes</button>
</form>
{% endblock %}"##;

const CANTEEN_MANAGE_REQUESTS_TEMPLATE: &str = r##"{% extends "base.html" %}
{% block title %}Requests - FoodShare{% endblock %}
{% block content %}
<h1>Donation Requests</h1>
{% if requests %}
<table>
    <tr><th>Item</th><th>NGO</th><th>Requested</th><th>Status</th><th></th></tr>
    {% for r in requests %}
    <tr>
        <td>{{ r.item_name }}</td>
        <td>{{ r.ngo_name }}</td>
        <td>{{ r.request_time }}</td>
        <td><span class="status {{ r.status }}">{{ r.status }}</span></td>
        <td>
            {% if r.status == "pending" %}
            <form class="inline-form" method="post" action="/canteen/manage_requests">
                <input type="hidden" name="request_id" value="{{ r.id }}">
                <button name="action" value="approve" type="submit">Approve</button>
                <button class="secondary" name="action" value="reject" type="submit">Reject</button>
            </form>
            {% endif %}
        </td>
    </tr>
    {% endfor %}
</table>
{% else %}
<p class="empty">No requests against your listings.</p>
{% endif %}
{% endblock %}"##;

const CANTEEN_WASTE_REPORT_TEMPLATE: &str = r##"{% extends "base.html" %}
{% block title %}Report Waste - FoodShare{% endblock %}
{% block content %}
<h1>File Waste Report</h1>
{% if available_food %}
<form class="stack" method="post" action="/canteen/file_waste_report">
    <label>Food item
        <select name="food_id" required>
            {% for f in available_food %}
            <option value="{{ f.id }}">{{ f.item_name }} ({{ f.quantity }} {{ f.unit }}, expires {{ f.expiry_time }})</option>
            {% endfor %}
        </select>
    </label>
    <label>Quantity wasted
        <input type="number" name="quantity_wasted" min="1" required>
    </label>
    <label>Reason
        <input type="text" name="reason" required>
    </label>
    <button type="submit">File report</button>
</form>
{% else %}
<p class="empty">No available food to report against.</p>
{% endif %}
{% endblock %}"##;

const CANTEEN_LEADERBOARD_TEMPLATE: &str = r##"{% extends "base.html" %}
{% block title %}Leaderboard - FoodShare{% endblock %}
{% block content %}
<h1>Waste-Reduction Leaderboard</h1>
{% if your_rank %}
<div class="stats">
    <div class="stat-card"><div class="value">#{{ your_rank }}</div><div class="label">Your rank</div></div>
    <div class="stat-card"><div class="value">{{ your_score }}</div><div class="label">Your score</div></div>
</div>
{% else %}
<p class="empty">List and donate food to enter the leaderboard.</p>
{% endif %}
<h2>Top canteens</h2>
{% if top_canteens %}
<table>
    <tr><th>Rank</th><th>Canteen</th><th>Score</th></tr>
    {% for c in top_canteens %}
    <tr>
        <td>#{{ c.rank }}</td>
        <td>{{ c.name }}{% if c.is_you %} (you){% endif %}</td>
        <td>{{ c.waste_score }}</td>
    </tr>
    {% endfor %}
</table>
{% else %}
<p class="empty">No canteen has listed food yet.</p>
{% endif %}
{% endblock %}"##;

const NGO_DASHBOARD_TEMPLATE: &str = r##"{% extends "base.html" %}
{% block title %}{{ ngo_name }} - FoodShare{% endblock %}
{% block content %}
<h1>{{ ngo_name }}</h1>
<h2>Available surplus food</h2>
{% if available_food %}
<table>
    <tr><th>Item</th><th>Quantity</th><th>Expires</th><th>Canteen</th><th></th></tr>
    {% for f in available_food %}
    <tr>
        <td>{{ f.item_name }}</td>
        <td>{{ f.quantity }} {{ f.unit }}</td>
        <td>{{ f.expiry_time }}</td>
        <td>{{ f.canteen_name }}</td>
        <td>
            <form class="inline-form" method="post" action="/ngo/request">
                <input type="hidden" name="food_id" value="{{ f.id }}">
                <button type="submit">Request pickup</button>
            </form>
        </td>
    </tr>
    {% endfor %}
</table>
{% else %}
<p class="empty">No surplus food is available right now.</p>
{% endif %}
{% endblock %}"##;

const NGO_HISTORY_TEMPLATE: &str = r##"{% extends "base.html" %}
{% block title %}History - FoodShare{% endblock %}
{% block content %}
<h1>Donation History</h1>
{% if history %}
<table>
    <tr><th>Request</th><th>Item</th><th>Canteen</th><th>Requested</th><th>Status</th></tr>
    {% for h in history %}
    <tr>
        <td>#{{ h.request_id }}</td>
        <td>{{ h.item_name }}</td>
        <td>{{ h.canteen_name }}</td>
        <td>{{ h.request_time }}</td>
        <td><span class="status {{ h.status }}">{{ h.status }}</span></td>
    </tr>
    {% endfor %}
</table>
{% else %}
<p class="empty">You haven't requested any pickups yet.</p>
{% endif %}
{% endblock %}"##;

const NGO_RECORD_BENEFICIARIES_TEMPLATE: &str = r##"{% extends "base.html" %}
{% block title %}Record Impact - FoodShare{% endblock %}
{% block content %}
<h1>Record Beneficiaries</h1>
{% if completed_donations %}
<form class="stack" method="post" action="/ngo/record_beneficiaries">
    <label>Approved donation
        <select name="donation_id" required>
            {% for d in completed_donations %}
            <option value="{{ d.donation_id }}">{{ d.item_name }} from {{ d.canteen_name }} (approved {{ d.approved_time }})</option>
            {% endfor %}
        </select>
    </label>
    <label>People served
        <input type="number" name="people_served" min="1" required>
    </label>
    <label>Location
        <input type="text" name="location" required>
    </label>
    <button type="submit">Submit impact report</button>
</form>
{% else %}
<p class="empty">No approved donations waiting for an impact report.</p>
{% endif %}
{% endblock %}"##;
